//! `nes_pal` implements loading NES .pal palette files, the 4 color palettes
//! tiles are drawn with and the raster type tiles are rendered into.
//!
//! Going from colors back to tile indices is done with a `Quantizer`. Any
//! quantizer is approximate: art which uses more than 4 colors per tile
//! loses information.

use nes_chr::{CHRError, Tile, TILE_DIM};
use serde::{Deserialize, Serialize};
use thiserror::Error;


/// `Color` describes a parsed PAL entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Color {
    /// Build a color from its components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    // Squared euclidean distance in RGB space.
    fn distance(self, other: Self) -> u32 {
        let d = |a: u8, b: u8| {
            let v = i32::from(a) - i32::from(b);
            v.unsigned_abs().pow(2)
        };
        d(self.r, other.r) + d(self.g, other.g) + d(self.b, other.b)
    }
}

/// `PaletteError` defines the ways building a palette can fail.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaletteError {
    /// A tile palette must have exactly 4 colors.
    #[error("palette must have {PALETTE_SIZE} colors, got {got}")]
    InvalidPaletteSize {
        /// Number of colors supplied.
        got: usize,
    },

    /// PAL data which isn't 64 RGB entries.
    #[error("must have {TOTAL_SIZE} bytes for {ENTRIES} entries in the PAL data, got {got}")]
    InvalidPalFile {
        /// Number of bytes supplied.
        got: usize,
    },

    /// A palette selection refers past the end of the master palette.
    #[error("master palette index {index} out of range, only {count} entries")]
    MasterIndexOutOfRange {
        /// The requested entry.
        index: usize,
        /// Entries available.
        count: usize,
    },
}

/// Number of entries in an NES master palette.
pub const ENTRIES: usize = 64;
const BYTE_PER_ENTRY: usize = 3;
const TOTAL_SIZE: usize = ENTRIES * BYTE_PER_ENTRY;

/// Number of colors a tile can reference.
pub const PALETTE_SIZE: usize = 4;

/// Given the input slice of raw PAL data return a Vec of parsed entries.
///
/// # Errors
/// The input must be exactly sized to 192 bytes (64 entries) to match NES palettes or
/// an error will result.
pub fn parse_pal(input: &[u8]) -> Result<Vec<Color>, PaletteError> {
    if input.len() != TOTAL_SIZE {
        return Err(PaletteError::InvalidPalFile { got: input.len() });
    }
    Ok(input
        .chunks_exact(BYTE_PER_ENTRY)
        .map(|c| Color::new(c[0], c[1], c[2]))
        .collect())
}

/// `Palette` is the 4 colors a tile's 2 bit pixel values index into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Palette {
    /// Entry 0 is the background color.
    pub colors: [Color; PALETTE_SIZE],
}

/// A 4 step grayscale from black to white.
pub const GRAYSCALE: Palette = Palette {
    colors: [
        Color::new(0, 0, 0),
        Color::new(85, 85, 85),
        Color::new(170, 170, 170),
        Color::new(255, 255, 255),
    ],
};

impl Default for Palette {
    fn default() -> Self {
        GRAYSCALE
    }
}

impl Palette {
    /// Build a palette from a slice of colors.
    ///
    /// # Errors
    /// `InvalidPaletteSize` unless there are exactly 4 colors.
    pub fn new(colors: &[Color]) -> Result<Self, PaletteError> {
        let colors: [Color; PALETTE_SIZE] = colors
            .try_into()
            .map_err(|_| PaletteError::InvalidPaletteSize { got: colors.len() })?;
        Ok(Self { colors })
    }

    /// Build a palette by picking 4 entries out of a master palette
    /// (as loaded by `parse_pal`). This is how the PPU palette RAM works.
    ///
    /// # Errors
    /// `MasterIndexOutOfRange` if any index is past the end of `master`.
    pub fn from_master(master: &[Color], indices: [u8; PALETTE_SIZE]) -> Result<Self, PaletteError> {
        let mut colors = [Color::default(); PALETTE_SIZE];
        for (c, i) in colors.iter_mut().zip(indices) {
            *c = *master
                .get(usize::from(i))
                .ok_or(PaletteError::MasterIndexOutOfRange {
                    index: usize::from(i),
                    count: master.len(),
                })?;
        }
        Ok(Self { colors })
    }

    /// Look up the color for a pixel value. None for anything over 3.
    #[must_use]
    pub fn color(&self, index: u8) -> Option<Color> {
        self.colors.get(usize::from(index)).copied()
    }
}

/// `Raster` is a rectangular block of pixels where `None` is transparent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<Option<Color>>,
}

impl Raster {
    /// A fully transparent raster.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; width * height],
        }
    }

    /// A raster filled with a single color.
    #[must_use]
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![Some(color); width * height],
        }
    }

    /// Build from row major pixels. Returns None if the length doesn't
    /// match the dimensions.
    #[must_use]
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Option<Color>>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row major pixel data.
    #[must_use]
    pub fn pixels(&self) -> &[Option<Color>] {
        &self.pixels
    }

    /// Pixel at `x`, `y` or None if transparent or outside the raster.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels[y * self.width + x]
    }

    /// Set the pixel at `x`, `y`. Writes outside the raster are clipped.
    pub fn set(&mut self, x: usize, y: usize, c: Option<Color>) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = c;
        }
    }

    /// Copy all of `src` into this raster with its top left at `x`, `y`.
    /// Anything falling outside is clipped.
    pub fn paste(&mut self, src: &Raster, x: usize, y: usize) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                self.set(x + sx, y + sy, src.pixels[sy * src.width + sx]);
            }
        }
    }

    /// Return the `width` x `height` block starting at `x`, `y`. Anything
    /// outside of this raster comes back transparent.
    #[must_use]
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Raster {
        let mut ret = Raster::new(width, height);
        for dy in 0..height {
            for dx in 0..width {
                ret.pixels[dy * width + dx] = self.get(x + dx, y + dy);
            }
        }
        ret
    }
}

/// Render a tile into an 8x8 raster using the given palette.
///
/// # Errors
/// `InvalidPixelValue` for the first pixel larger than 3.
pub fn render_tile(tile: &Tile, palette: &Palette) -> Result<Raster, CHRError> {
    let mut pixels = Vec::with_capacity(TILE_DIM * TILE_DIM);
    for (i, value) in tile.data.iter().enumerate() {
        let c = palette.color(*value).ok_or(CHRError::InvalidPixelValue {
            row: i / TILE_DIM,
            col: i % TILE_DIM,
            value: *value,
        })?;
        pixels.push(Some(c));
    }
    Ok(Raster {
        width: TILE_DIM,
        height: TILE_DIM,
        pixels,
    })
}

/// Render each tile in order with the same palette.
///
/// # Errors
/// The first `InvalidPixelValue` found.
pub fn render_tiles(tiles: &[Tile], palette: &Palette) -> Result<Vec<Raster>, CHRError> {
    tiles.iter().map(|t| render_tile(t, palette)).collect()
}

/// `Quantizer` picks the 2 bit pixel value to use for a color when turning
/// art back into tiles. Implementations are lossy.
pub trait Quantizer {
    /// Return a value in 0-3 for the given pixel (None is transparent).
    fn index(&self, c: Option<Color>) -> u8;
}

/// `NearestColor` maps each color to the closest palette entry by RGB
/// distance. Ties go to the lower index. Transparent maps to 0.
#[derive(Clone, Copy, Debug)]
pub struct NearestColor(pub Palette);

impl Quantizer for NearestColor {
    fn index(&self, c: Option<Color>) -> u8 {
        let Some(c) = c else {
            return 0;
        };
        let mut best = 0;
        let mut best_dist = u32::MAX;
        for (i, p) in (0u8..).zip(self.0.colors.iter()) {
            let d = c.distance(*p);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    }
}

/// `Brightness` buckets the mean of R, G and B into quarters (0-63, 64-127,
/// 128-191, 192-255). Only useful for grayscale art. Transparent maps to 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct Brightness;

impl Quantizer for Brightness {
    fn index(&self, c: Option<Color>) -> u8 {
        let Some(c) = c else {
            return 0;
        };
        let mean = (u16::from(c.r) + u16::from(c.g) + u16::from(c.b)) / 3;
        // mean is at most 255 so this fits.
        #[allow(clippy::cast_possible_truncation)]
        let ret = (mean / 64) as u8;
        ret
    }
}

/// Build a tile from the 8x8 block of `raster` at `x`, `y` using `q` to pick
/// pixel values. Pixels outside the raster are treated as transparent.
#[must_use]
pub fn quantize_tile(raster: &Raster, x: usize, y: usize, q: &dyn Quantizer) -> Tile {
    let mut tile = Tile::default();
    for row in 0..TILE_DIM {
        for col in 0..TILE_DIM {
            tile.set_pixel(row, col, q.index(raster.get(x + col, y + row)));
        }
    }
    tile
}

/// Convert a whole raster to tiles, left to right then top to bottom.
/// Partial tiles on the right and bottom edges are padded as transparent.
#[must_use]
pub fn quantize_raster(raster: &Raster, q: &dyn Quantizer) -> Vec<Tile> {
    let across = raster.width.div_ceil(TILE_DIM);
    let down = raster.height.div_ceil(TILE_DIM);
    let mut ret = Vec::with_capacity(across * down);
    for ty in 0..down {
        for tx in 0..across {
            ret.push(quantize_tile(raster, tx * TILE_DIM, ty * TILE_DIM, q));
        }
    }
    ret
}
