//! `chr_export` ties the codec, palette and sprite crates to the filesystem.
//! It reads and writes PNGs, exports whole banks or sprite lists, splits
//! pre-rendered sheets into unique tiles and keeps a JSON catalog describing
//! everything written.
//!
//! Batch operations never stop at the first bad item. Every item is
//! attempted and failures come back together in a `BatchErrors`.

use image::{Rgba, RgbaImage};
use ines::{BankSize, Container, INESError};
use log::{debug, info};
use nes_chr::{map_chr_rom, CHRError, Tile, TILE_DIM};
use nes_pal::{parse_pal, quantize_tile, render_tiles, Palette, PaletteError, Quantizer, Raster};
use nes_sprite::{compose, dedupe, sheet, split, ComposeError, MissingTile, SpriteDef, SHEET_COLUMNS};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use strum_macros::{Display as StrumDisplay, EnumString};
use thiserror::Error;


/// Filename the catalog is written to inside an output directory.
pub const CATALOG_FILE: &str = "catalog.json";

/// Master palette entries used when a .pal file is given without a color
/// selection: black, dark gray, light gray, white.
pub const DEFAULT_MASTER_COLORS: [u8; 4] = [0x0F, 0x00, 0x10, 0x30];

/// `ExportError` is anything that can go wrong reading or writing assets.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Problem locating CHR data.
    #[error(transparent)]
    INES(#[from] INESError),

    /// Problem decoding or encoding tiles.
    #[error(transparent)]
    CHR(#[from] CHRError),

    /// Problem building a palette.
    #[error(transparent)]
    Palette(#[from] PaletteError),

    /// Problem composing a sprite.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// Filesystem error.
    #[error("{}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// PNG encode/decode error.
    #[error("{}: {source}", path.display())]
    Image {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        source: image::ImageError,
    },

    /// Catalog or definition JSON error.
    #[error("{}: {source}", path.display())]
    Json {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Master palette colors were picked without a .pal file to pick from.
    #[error("palette colors given without a .pal file")]
    NoMasterPalette,

    /// A sheet to split has no whole cells of the requested size.
    #[error("{}: no whole {cell}x{cell} cells in a {width}x{height} image", path.display())]
    NoCells {
        /// Image being split.
        path: PathBuf,
        /// Requested cell size.
        cell: usize,
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `BatchErrors` collects the failures from a batch so all of them can be
/// reported once the batch is done.
#[derive(Debug, Default)]
pub struct BatchErrors {
    /// Item name and what went wrong with it.
    pub failures: Vec<(String, ExportError)>,
}

impl BatchErrors {
    /// Record a failure for `item`.
    pub fn push(&mut self, item: impl Into<String>, err: ExportError) {
        self.failures.push((item.into(), err));
    }

    /// True if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Ok if nothing failed, otherwise self as the error.
    ///
    /// # Errors
    /// Returns self if any item failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for BatchErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} item(s) failed:", self.failures.len())?;
        for (item, err) in &self.failures {
            writeln!(f, "  {item}: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchErrors {}

/// `CatalogEntry` describes one image written by an export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Name of the sheet, tile or sprite.
    pub name: String,

    /// Grouping for sprites.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,

    /// Bank the tiles came from.
    pub bank: usize,

    /// First tile index used.
    pub base_tile: usize,

    /// Tile order relative to `base_tile`. Empty for whole bank sheets.
    #[serde(default)]
    pub arrangement: Vec<usize>,

    /// Path of the image relative to the catalog.
    pub file: String,

    /// Top left pixel of every place this image was found in a split sheet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<[usize; 2]>,
}

/// `Catalog` is the JSON sidecar written next to exported images.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Input file the assets came from.
    pub source: String,

    /// Bank unit used to slice the input. Empty for split sheets.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bank_size: String,

    /// Palette used to color the images. None when the images kept the
    /// colors of a source PNG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,

    /// Everything written.
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Start an empty catalog.
    #[must_use]
    pub fn new(source: &str, size: BankSize, palette: Palette) -> Self {
        Self {
            source: source.into(),
            bank_size: size.to_string(),
            palette: Some(palette),
            entries: Vec::new(),
        }
    }

    /// Write as pretty JSON to `path`.
    ///
    /// # Errors
    /// Serialization or filesystem errors.
    pub fn write(&self, path: &Path) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err(path))?;
        info!("Wrote catalog with {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Load a catalog from `path`.
    ///
    /// # Errors
    /// Filesystem or parse errors.
    pub fn read(path: &Path) -> Result<Self, ExportError> {
        let data = fs::read(path).map_err(io_err(path))?;
        serde_json::from_slice(&data).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load a list of sprite definitions from a JSON file.
///
/// # Errors
/// Filesystem or parse errors.
pub fn read_sprite_defs(path: &Path) -> Result<Vec<SpriteDef>, ExportError> {
    let data = fs::read(path).map_err(io_err(path))?;
    serde_json::from_slice(&data).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the palette tools should render with. With no .pal file the
/// grayscale palette is used. With one, `colors` (or the default black to
/// white selection) picks 4 entries from it.
///
/// # Errors
/// Filesystem errors, a bad .pal file, a selection that isn't 4 entries or
/// is out of range and colors without a .pal file.
pub fn load_palette(pal: Option<&Path>, colors: Option<&[u8]>) -> Result<Palette, ExportError> {
    let indices = match colors {
        Some(c) => c
            .try_into()
            .map_err(|_| PaletteError::InvalidPaletteSize { got: c.len() })?,
        None => DEFAULT_MASTER_COLORS,
    };
    match pal {
        None if colors.is_some() => Err(ExportError::NoMasterPalette),
        None => Ok(Palette::default()),
        Some(path) => {
            let master = parse_pal(&fs::read(path).map_err(io_err(path))?)?;
            Ok(Palette::from_master(&master, indices)?)
        }
    }
}

/// Convert a raster to an RGBA image. Transparent pixels get alpha 0.
#[must_use]
pub fn raster_to_image(r: &Raster) -> RgbaImage {
    // Rasters are tiles or sheets so dimensions always fit in u32.
    #[allow(clippy::cast_possible_truncation)]
    let mut img = RgbaImage::new(r.width() as u32, r.height() as u32);
    for (x, y, p) in img.enumerate_pixels_mut() {
        *p = match r.get(x as usize, y as usize) {
            Some(c) => Rgba([c.r, c.g, c.b, 0xFF]),
            None => Rgba([0, 0, 0, 0]),
        };
    }
    img
}

/// Convert an RGBA image to a raster. Any pixel with alpha 0 is transparent.
#[must_use]
pub fn image_to_raster(img: &RgbaImage) -> Raster {
    let mut r = Raster::new(img.width() as usize, img.height() as usize);
    for (x, y, p) in img.enumerate_pixels() {
        let [red, green, blue, alpha] = p.0;
        if alpha != 0 {
            r.set(
                x as usize,
                y as usize,
                Some(nes_pal::Color::new(red, green, blue)),
            );
        }
    }
    r
}

/// Write a raster as a PNG, creating parent directories as needed.
///
/// # Errors
/// Filesystem or encode errors.
pub fn write_png(r: &Raster, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(io_err(parent))?;
    }
    raster_to_image(r)
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| ExportError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Wrote {}x{} PNG {}", r.width(), r.height(), path.display());
    Ok(())
}

/// Read any PNG into a raster.
///
/// # Errors
/// Filesystem or decode errors.
pub fn read_png(path: &Path) -> Result<Raster, ExportError> {
    let img = image::open(path).map_err(|source| ExportError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image_to_raster(&img.to_rgba8()))
}

// Catalog paths always use / so they're portable.
fn relative(out_dir: &Path, path: &Path) -> String {
    path.strip_prefix(out_dir)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode and render every tile of one bank.
///
/// # Errors
/// Misaligned bank data.
pub fn render_bank(bank: &[u8], size: BankSize, palette: &Palette) -> Result<Vec<Raster>, ExportError> {
    let tiles = map_chr_rom(bank, size)?;
    Ok(render_tiles(&tiles, palette)?)
}

/// Write one bank as a 16 tile wide sheet (`bank_N.png`) and optionally
/// every tile on its own (`bank_N/tile_XXX.png`). Returns catalog entries
/// for what was written.
///
/// # Errors
/// Decode, layout or filesystem errors.
pub fn export_bank(
    bank: &[u8],
    index: usize,
    size: BankSize,
    palette: &Palette,
    out_dir: &Path,
    tiles: bool,
) -> Result<Vec<CatalogEntry>, ExportError> {
    let rendered = render_bank(bank, size, palette)?;
    let mut entries = Vec::new();

    let sheet_img = sheet(&rendered, SHEET_COLUMNS, palette.colors[0])?;
    let path = out_dir.join(format!("bank_{index}.png"));
    write_png(&sheet_img, &path)?;
    info!("Saved CHR bank {index} to {}", path.display());
    entries.push(CatalogEntry {
        name: format!("bank_{index}"),
        category: String::new(),
        bank: index,
        base_tile: 0,
        arrangement: Vec::new(),
        file: relative(out_dir, &path),
        positions: Vec::new(),
    });

    if tiles {
        for (i, t) in rendered.iter().enumerate() {
            let path = out_dir
                .join(format!("bank_{index}"))
                .join(format!("tile_{i:03}.png"));
            write_png(t, &path)?;
            entries.push(CatalogEntry {
                name: format!("bank_{index}_tile_{i:03}"),
                category: String::new(),
                bank: index,
                base_tile: i,
                arrangement: vec![0],
                file: relative(out_dir, &path),
                positions: Vec::new(),
            });
        }
        debug!("Saved {} tiles for bank {index}", rendered.len());
    }
    Ok(entries)
}

/// Export every bank in `data`. Banks are independent so a failure in one
/// doesn't stop the rest.
///
/// # Errors
/// Errors locating the CHR data at all. Per bank errors come back in the
/// `BatchErrors` alongside the catalog of what succeeded.
pub fn export_banks(
    source: &str,
    container: Container,
    data: &[u8],
    size: BankSize,
    palette: &Palette,
    out_dir: &Path,
    tiles: bool,
) -> Result<(Catalog, BatchErrors), ExportError> {
    let count = container.bank_count(data, size)?;
    info!("Found {count} {size} CHR banks in {source}");

    let mut catalog = Catalog::new(source, size, *palette);
    let mut errors = BatchErrors::default();
    for i in 0..count {
        let res = container
            .bank_at(data, i, size)
            .map_err(ExportError::from)
            .and_then(|bank| export_bank(bank, i, size, palette, out_dir, tiles));
        match res {
            Ok(mut e) => catalog.entries.append(&mut e),
            Err(e) => errors.push(format!("bank {i}"), e),
        }
    }
    Ok((catalog, errors))
}

/// Compose and write each sprite in `defs` from one bank. Sprites go to
/// `<category>/<name>.png` (or `<name>.png` with no category).
///
/// # Errors
/// Errors decoding the bank. Per sprite errors come back in the
/// `BatchErrors` alongside the catalog of what succeeded.
#[allow(clippy::too_many_arguments)]
pub fn export_sprites(
    source: &str,
    bank: &[u8],
    index: usize,
    size: BankSize,
    palette: &Palette,
    defs: &[SpriteDef],
    missing: MissingTile,
    out_dir: &Path,
) -> Result<(Catalog, BatchErrors), ExportError> {
    let rendered = render_bank(bank, size, palette)?;
    let mut catalog = Catalog::new(source, size, *palette);
    let mut errors = BatchErrors::default();

    for def in defs {
        let mut path = out_dir.to_path_buf();
        if !def.category.is_empty() {
            path.push(&def.category);
        }
        path.push(format!("{}.png", def.name));

        let res = def
            .compose(&rendered, missing)
            .map_err(ExportError::from)
            .and_then(|img| write_png(&img, &path));
        match res {
            Ok(()) => {
                info!("Saved sprite {} to {}", def.name, path.display());
                catalog.entries.push(CatalogEntry {
                    name: def.name.clone(),
                    category: def.category.clone(),
                    bank: index,
                    base_tile: def.base_tile,
                    arrangement: def.arrangement.clone(),
                    file: relative(out_dir, &path),
                    positions: Vec::new(),
                });
            }
            Err(e) => errors.push(def.name.clone(), e),
        }
    }
    Ok((catalog, errors))
}

/// Split the image at `path` into `cell` x `cell` cells and keep one copy of
/// each distinct cell. The unique cells are written as `tileset.png`
/// (`columns` wide, transparent where unused) and optionally one PNG each as
/// `tiles/tile_XXX.png`. Catalog entries list every position a cell was
/// found at. Partial cells on the right and bottom edges are ignored.
///
/// # Errors
/// Read/write errors, `NoCells` if the image has no whole cells and
/// `InvalidGridWidth` for zero columns.
pub fn export_unique_tiles(
    path: &Path,
    cell: usize,
    columns: usize,
    out_dir: &Path,
    tiles: bool,
) -> Result<Catalog, ExportError> {
    if columns == 0 {
        return Err(ComposeError::InvalidGridWidth.into());
    }
    let r = read_png(path)?;
    let cells = split(&r, cell, cell);
    if cells.is_empty() {
        return Err(ExportError::NoCells {
            path: path.to_path_buf(),
            cell,
            width: r.width(),
            height: r.height(),
        });
    }
    let across = r.width() / cell;
    let unique = dedupe(&cells);
    info!(
        "{} has {} cells, {} unique",
        path.display(),
        cells.len(),
        unique.len()
    );

    let mut catalog = Catalog {
        source: path.display().to_string(),
        ..Catalog::default()
    };

    let rasters: Vec<Raster> = unique.iter().map(|u| u.raster.clone()).collect();
    let order: Vec<usize> = (0..rasters.len()).collect();
    let tileset = compose(&rasters, &order, columns.min(rasters.len()), MissingTile::Error)?;
    let tileset_path = out_dir.join("tileset.png");
    write_png(&tileset, &tileset_path)?;
    info!("Saved tileset to {}", tileset_path.display());
    catalog.entries.push(CatalogEntry {
        name: "tileset".into(),
        category: String::new(),
        bank: 0,
        base_tile: 0,
        arrangement: Vec::new(),
        file: relative(out_dir, &tileset_path),
        positions: Vec::new(),
    });

    for (i, u) in unique.iter().enumerate() {
        let file = if tiles {
            let p = out_dir.join("tiles").join(format!("tile_{i:03}.png"));
            write_png(&u.raster, &p)?;
            relative(out_dir, &p)
        } else {
            relative(out_dir, &tileset_path)
        };
        catalog.entries.push(CatalogEntry {
            name: format!("tile_{i:03}"),
            category: String::new(),
            bank: 0,
            base_tile: i,
            arrangement: vec![0],
            file,
            positions: u
                .positions
                .iter()
                .map(|p| [(p % across) * cell, (p / across) * cell])
                .collect(),
        });
    }
    Ok(catalog)
}

/// `TileOrder` is the order tiles are pulled out of an image when
/// converting it to CHR data.
#[derive(Clone, Copy, Debug, Default, StrumDisplay, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TileOrder {
    /// Left to right, top to bottom across the whole image.
    #[default]
    Rows,

    /// Image is a sheet of 16x16 sprites. Each sprite's 4 tiles are emitted
    /// together as top left, top right, bottom left, bottom right.
    Sprites,
}

/// Convert a raster into tiles using `q` to choose pixel values. Partial
/// tiles at the edges are padded with transparent (0) pixels.
#[must_use]
pub fn raster_to_tiles(r: &Raster, q: &dyn Quantizer, order: TileOrder) -> Vec<Tile> {
    match order {
        TileOrder::Rows => nes_pal::quantize_raster(r, q),
        TileOrder::Sprites => {
            let cell = TILE_DIM * 2;
            let across = r.width().div_ceil(cell);
            let down = r.height().div_ceil(cell);
            let mut ret = Vec::with_capacity(across * down * 4);
            for sy in 0..down {
                for sx in 0..across {
                    for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                        let x = sx * cell + dx * TILE_DIM;
                        let y = sy * cell + dy * TILE_DIM;
                        ret.push(quantize_tile(r, x, y, q));
                    }
                }
            }
            ret
        }
    }
}

/// Read a PNG and return its CHR encoding.
///
/// # Errors
/// Read/decode errors.
pub fn png_to_chr(path: &Path, q: &dyn Quantizer, order: TileOrder) -> Result<Vec<u8>, ExportError> {
    let r = read_png(path)?;
    let tiles = raster_to_tiles(&r, q, order);
    debug!("{} converted to {} tiles", path.display(), tiles.len());
    Ok(nes_chr::encode_tiles(&tiles)?)
}

/// Convert each PNG in turn and concatenate the CHR data in the order
/// given. Files that fail are skipped in the output and reported together.
#[must_use]
pub fn pngs_to_chr(paths: &[PathBuf], q: &dyn Quantizer, order: TileOrder) -> (Vec<u8>, BatchErrors) {
    let mut out = Vec::new();
    let mut errors = BatchErrors::default();
    for p in paths {
        match png_to_chr(p, q, order) {
            Ok(mut d) => {
                info!("Converted {} ({} bytes)", p.display(), d.len());
                out.append(&mut d);
            }
            Err(e) => errors.push(p.display().to_string(), e),
        }
    }
    (out, errors)
}
