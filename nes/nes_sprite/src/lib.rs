//! `nes_sprite` builds larger images out of 8x8 tiles.
//!
//! Games rarely draw a single tile on its own. Characters are usually 2x2
//! tiles (16x16) and the tiles making them up aren't always stored in
//! reading order, so composition goes through an arrangement table.

use ahash::{HashMap, HashMapExt};
use nes_chr::TILE_DIM;
use nes_pal::{Color, Raster};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;


/// Tiles in reading order: top left, top right, bottom left, bottom right.
pub const ROW_MAJOR: [usize; 4] = [0, 1, 2, 3];

/// Tiles stored column by column as 8x16 sprite hardware lays them out
/// (top left, bottom left, top right, bottom right).
pub const COLUMN_MAJOR: [usize; 4] = [0, 2, 1, 3];

/// Columns used for a bank sheet. 16 tiles across gives 128 pixels.
pub const SHEET_COLUMNS: usize = 16;

/// `MissingTile` decides what happens when an arrangement refers to a tile
/// that doesn't exist.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MissingTile {
    /// Fail the composition.
    #[default]
    Error,

    /// Leave that block of the output transparent.
    Transparent,
}

/// `ComposeError` defines the ways building a composite can fail.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ComposeError {
    /// An arrangement entry points past the supplied tiles.
    #[error("slot {slot} wants tile {index} but only {available} tiles are available")]
    CompositionIndexError {
        /// Output block being filled.
        slot: usize,
        /// Tile index requested.
        index: usize,
        /// Number of tiles supplied.
        available: usize,
    },

    /// Source tiles aren't all the same size.
    #[error("tile {index} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    TileSizeMismatch {
        /// The offending tile.
        index: usize,
        /// Its width.
        got_w: usize,
        /// Its height.
        got_h: usize,
        /// Width of the first tile.
        want_w: usize,
        /// Height of the first tile.
        want_h: usize,
    },

    /// Zero columns can't hold anything.
    #[error("grid width must be at least 1")]
    InvalidGridWidth,

    /// A sprite definition whose arrangement doesn't cover its size.
    #[error("sprite {name} is {width}x{height} tiles but arrangement has {got} entries")]
    ArrangementLength {
        /// Sprite name.
        name: String,
        /// Width in tiles.
        width: usize,
        /// Height in tiles.
        height: usize,
        /// Entries in the arrangement.
        got: usize,
    },

    /// `base_tile` plus an arrangement entry doesn't fit in a usize.
    #[error("sprite {name} tile {base_tile} + {offset} is out of range")]
    TileIndexOverflow {
        /// Sprite name.
        name: String,
        /// The sprite's first tile.
        base_tile: usize,
        /// Arrangement entry being added.
        offset: usize,
    },

    /// The output would have more pixels than can be addressed.
    #[error("{columns}x{rows} grid of {cell_w}x{cell_h} cells is too large")]
    GridTooLarge {
        /// Columns requested.
        columns: usize,
        /// Rows needed.
        rows: usize,
        /// Cell width.
        cell_w: usize,
        /// Cell height.
        cell_h: usize,
    },
}

// All tiles have to match the first one. An empty slice has no size.
fn cell_size(tiles: &[Raster]) -> Result<Option<(usize, usize)>, ComposeError> {
    let Some(first) = tiles.first() else {
        return Ok(None);
    };
    let (w, h) = (first.width(), first.height());
    for (index, t) in tiles.iter().enumerate() {
        if t.width() != w || t.height() != h {
            return Err(ComposeError::TileSizeMismatch {
                index,
                got_w: t.width(),
                got_h: t.height(),
                want_w: w,
                want_h: h,
            });
        }
    }
    Ok(Some((w, h)))
}

// Pixel dimensions of a grid of cells.
fn grid_pixels(
    columns: usize,
    rows: usize,
    cell_w: usize,
    cell_h: usize,
) -> Result<(usize, usize), ComposeError> {
    let too_large = || ComposeError::GridTooLarge {
        columns,
        rows,
        cell_w,
        cell_h,
    };
    let width = columns.checked_mul(cell_w).ok_or_else(too_large)?;
    let height = rows.checked_mul(cell_h).ok_or_else(too_large)?;
    width.checked_mul(height).ok_or_else(too_large)?;
    Ok((width, height))
}

/// Compose `tiles` into one raster. Output block `i` (row major across
/// `grid_width` columns) is filled from `tiles[arrangement[i]]`.
///
/// # Errors
/// `InvalidGridWidth`, `GridTooLarge`, `TileSizeMismatch` and (with
/// `MissingTile::Error`) `CompositionIndexError`.
pub fn compose(
    tiles: &[Raster],
    arrangement: &[usize],
    grid_width: usize,
    missing: MissingTile,
) -> Result<Raster, ComposeError> {
    if grid_width == 0 {
        return Err(ComposeError::InvalidGridWidth);
    }
    // With no tiles every block is missing so size them as plain tiles.
    let (w, h) = cell_size(tiles)?.unwrap_or((TILE_DIM, TILE_DIM));
    let rows = arrangement.len().div_ceil(grid_width);
    let (out_w, out_h) = grid_pixels(grid_width, rows, w, h)?;
    let mut out = Raster::new(out_w, out_h);

    for (slot, index) in arrangement.iter().enumerate() {
        let x = (slot % grid_width) * w;
        let y = (slot / grid_width) * h;
        match tiles.get(*index) {
            Some(t) => out.paste(t, x, y),
            None => match missing {
                MissingTile::Error => {
                    return Err(ComposeError::CompositionIndexError {
                        slot,
                        index: *index,
                        available: tiles.len(),
                    })
                }
                MissingTile::Transparent => {}
            },
        }
    }
    Ok(out)
}

/// Lay `tiles` out in order across `columns` columns, rounding the row count
/// up. Cells with no tile are filled with `background`.
///
/// # Errors
/// `InvalidGridWidth`, `GridTooLarge` or `TileSizeMismatch`.
pub fn sheet(tiles: &[Raster], columns: usize, background: Color) -> Result<Raster, ComposeError> {
    if columns == 0 {
        return Err(ComposeError::InvalidGridWidth);
    }
    let (w, h) = cell_size(tiles)?.unwrap_or((TILE_DIM, TILE_DIM));
    let rows = tiles.len().div_ceil(columns);
    let (out_w, out_h) = grid_pixels(columns, rows, w, h)?;
    let mut out = Raster::filled(out_w, out_h, background);
    for (i, t) in tiles.iter().enumerate() {
        out.paste(t, (i % columns) * w, (i / columns) * h);
    }
    Ok(out)
}

/// Slice a raster into `cell_w` x `cell_h` cells left to right, top to
/// bottom. Partial cells on the right and bottom edges are dropped.
#[must_use]
pub fn split(raster: &Raster, cell_w: usize, cell_h: usize) -> Vec<Raster> {
    if cell_w == 0 || cell_h == 0 {
        return Vec::new();
    }
    let across = raster.width() / cell_w;
    let down = raster.height() / cell_h;
    let mut ret = Vec::with_capacity(across * down);
    for y in 0..down {
        for x in 0..across {
            ret.push(raster.crop(x * cell_w, y * cell_h, cell_w, cell_h));
        }
    }
    ret
}

/// `UniqueCell` is one distinct cell found by `dedupe`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniqueCell {
    /// The cell contents.
    pub raster: Raster,

    /// Index (in the input) of every cell with identical content. The first
    /// entry is where it was first seen.
    pub positions: Vec<usize>,
}

/// Group identical cells together. Output is in order of first appearance.
#[must_use]
pub fn dedupe(cells: &[Raster]) -> Vec<UniqueCell> {
    let mut seen: HashMap<&Raster, usize> = HashMap::new();
    let mut ret: Vec<UniqueCell> = Vec::new();
    for (i, c) in cells.iter().enumerate() {
        if let Some(slot) = seen.get(c) {
            ret[*slot].positions.push(i);
        } else {
            seen.insert(c, ret.len());
            ret.push(UniqueCell {
                raster: c.clone(),
                positions: vec![i],
            });
        }
    }
    ret
}

fn default_dim() -> usize {
    2
}

fn default_arrangement() -> Vec<usize> {
    ROW_MAJOR.to_vec()
}

/// `SpriteDef` names a composite sprite within a bank. Usually loaded from
/// a JSON list handed to the tools.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteDef {
    /// Unique name, also used for the output filename.
    pub name: String,

    /// Grouping such as player, enemies or items.
    #[serde(default)]
    pub category: String,

    /// Index of the first tile. Arrangement entries are relative to this.
    pub base_tile: usize,

    /// Width in tiles.
    #[serde(default = "default_dim")]
    pub width: usize,

    /// Height in tiles.
    #[serde(default = "default_dim")]
    pub height: usize,

    /// Which tile (relative to `base_tile`) goes in each output block.
    #[serde(default = "default_arrangement")]
    pub arrangement: Vec<usize>,
}

impl SpriteDef {
    /// Check the arrangement covers exactly `width` x `height` blocks.
    ///
    /// # Errors
    /// `ArrangementLength` or `InvalidGridWidth` for a zero width.
    pub fn validate(&self) -> Result<(), ComposeError> {
        if self.width == 0 {
            return Err(ComposeError::InvalidGridWidth);
        }
        if self.width.checked_mul(self.height) != Some(self.arrangement.len()) {
            return Err(ComposeError::ArrangementLength {
                name: self.name.clone(),
                width: self.width,
                height: self.height,
                got: self.arrangement.len(),
            });
        }
        Ok(())
    }

    /// Absolute tile indices this sprite pulls from, in output order.
    ///
    /// # Errors
    /// `TileIndexOverflow` if `base_tile` plus an entry doesn't fit.
    pub fn tile_indices(&self) -> Result<Vec<usize>, ComposeError> {
        self.arrangement
            .iter()
            .map(|a| {
                self.base_tile
                    .checked_add(*a)
                    .ok_or_else(|| ComposeError::TileIndexOverflow {
                        name: self.name.clone(),
                        base_tile: self.base_tile,
                        offset: *a,
                    })
            })
            .collect()
    }

    /// Build the sprite from every tile of a bank (already rendered).
    ///
    /// # Errors
    /// Anything from `validate`, `tile_indices` or `compose`.
    pub fn compose(&self, bank: &[Raster], missing: MissingTile) -> Result<Raster, ComposeError> {
        self.validate()?;
        compose(bank, &self.tile_indices()?, self.width, missing)
    }
}
