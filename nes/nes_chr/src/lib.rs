//! `nes_chr` provides functions and structures for decoding and encoding
//! CHR ROM tiles for the NES.
//!
//! A tile on the NES is 8x8 pixels with 2 bits per pixel stored as 2 bit
//! planes. The first 8 bytes hold bit 0 of each pixel (one byte per row) and
//! the next 8 bytes hold bit 1. Bit 7 of each byte is the leftmost pixel.

use ines::BankSize;
use std::fmt::Write;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Bytes used to encode a single tile.
pub const TILE_BYTES: usize = 16;

/// Width and height of a tile in pixels.
pub const TILE_DIM: usize = 8;

/// `CHRError` defines the ways decoding or encoding tile data can fail.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CHRError {
    /// Tile data wasn't exactly 16 bytes.
    #[error("tile data must be {TILE_BYTES} bytes, got {len}")]
    MalformedInput {
        /// Length of the data supplied.
        len: usize,
    },

    /// A pixel outside of 0-3 was handed to the encoder.
    #[error("pixel at row {row} col {col} is {value} which doesn't fit in 2 bits")]
    InvalidPixelValue {
        /// Row of the bad pixel.
        row: usize,
        /// Column of the bad pixel.
        col: usize,
        /// The value found.
        value: u8,
    },

    /// The tile index is past the end of the bank.
    #[error("tile {index} out of range, bank holds {count} tiles")]
    TileIndexOutOfRange {
        /// The requested tile.
        index: usize,
        /// Number of tiles in the bank.
        count: usize,
    },

    /// Data handed to a bank level decode isn't a whole number of banks.
    #[error("length {len} isn't a multiple of {size} banks")]
    Misaligned {
        /// Length of the data supplied.
        len: usize,
        /// The bank unit in use.
        size: BankSize,
    },
}

/// `Tile` represents a parsed entry from the CHR ROM.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    /// This is the 8x8 tile with each value being 0-3 to indicate
    /// the color entry to use (where 0 is background). Stored row major.
    pub data: [u8; 8 * 8],
}

impl Default for Tile {
    fn default() -> Self {
        // Have to implement this ourselves as arrays don't go to 64 for defaults.
        Self { data: [0; 8 * 8] }
    }
}

impl Tile {
    /// Build a tile from 8 rows of pixel indices.
    #[must_use]
    pub fn from_rows(rows: [[u8; 8]; 8]) -> Self {
        let mut tile = Self::default();
        for (y, row) in rows.iter().enumerate() {
            tile.data[y * TILE_DIM..(y + 1) * TILE_DIM].copy_from_slice(row);
        }
        tile
    }

    /// The pixel index at `row`, `col`.
    ///
    /// # Panics
    /// If either coordinate is 8 or larger.
    #[must_use]
    pub fn pixel(&self, row: usize, col: usize) -> u8 {
        assert!(row < TILE_DIM && col < TILE_DIM, "({row}, {col}) outside tile");
        self.data[row * TILE_DIM + col]
    }

    /// Set the pixel index at `row`, `col`. `value` isn't range checked
    /// here. `encode_tile` and `nes_pal::render_tile` both reject a tile
    /// holding anything over 3 with `InvalidPixelValue`.
    ///
    /// # Panics
    /// If either coordinate is 8 or larger.
    pub fn set_pixel(&mut self, row: usize, col: usize, value: u8) {
        assert!(row < TILE_DIM && col < TILE_DIM, "({row}, {col}) outside tile");
        self.data[row * TILE_DIM + col] = value;
    }

    /// The tile as 8 rows of 8 pixel indices.
    #[must_use]
    pub fn rows(&self) -> [[u8; 8]; 8] {
        let mut rows = [[0; 8]; 8];
        for (y, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&self.data[y * TILE_DIM..(y + 1) * TILE_DIM]);
        }
        rows
    }

    /// Return a mirrored copy of the tile the same way the PPU applies the
    /// sprite attribute flip bits.
    #[must_use]
    pub fn flipped(&self, horizontal: bool, vertical: bool) -> Self {
        let mut ret = Self::default();
        for y in 0..TILE_DIM {
            for x in 0..TILE_DIM {
                let sx = if horizontal { TILE_DIM - 1 - x } else { x };
                let sy = if vertical { TILE_DIM - 1 - y } else { y };
                ret.data[y * TILE_DIM + x] = self.data[sy * TILE_DIM + sx];
            }
        }
        ret
    }
}

/// Decode a single 16 byte tile.
///
/// # Errors
/// `MalformedInput` if `data` isn't exactly 16 bytes.
pub fn decode_tile(data: &[u8]) -> Result<Tile, CHRError> {
    if data.len() != TILE_BYTES {
        return Err(CHRError::MalformedInput { len: data.len() });
    }
    let mut tile = Tile::default();

    // It's 2 bit planes so you need the the first bit from X and the
    // 2nd from X+8 OR'd with it.
    for row in 0..TILE_DIM {
        let low = data[row];
        let high = data[row + TILE_DIM];

        for col in 0..TILE_DIM {
            // Bit 7 is the first pixel and bit 0 the 8th.
            let bit = 7 - col;
            let one = (low >> bit) & 0x01;
            let two = (high >> bit) & 0x01;
            tile.data[row * TILE_DIM + col] = (two << 1) | one;
        }
    }
    Ok(tile)
}

/// Encode a tile back into its 16 byte bit plane form. This is the exact
/// inverse of `decode_tile`.
///
/// # Errors
/// `InvalidPixelValue` if any pixel is larger than 3.
pub fn encode_tile(tile: &Tile) -> Result<[u8; TILE_BYTES], CHRError> {
    let mut ret = [0u8; TILE_BYTES];

    for row in 0..TILE_DIM {
        for col in 0..TILE_DIM {
            let value = tile.data[row * TILE_DIM + col];
            if value > 0x03 {
                return Err(CHRError::InvalidPixelValue { row, col, value });
            }
            let bit = 7 - col;
            ret[row] |= (value & 0x01) << bit;
            ret[row + TILE_DIM] |= ((value & 0x02) >> 1) << bit;
        }
    }
    Ok(ret)
}

/// Encode a run of tiles into one contiguous CHR buffer in order.
///
/// # Errors
/// The first `InvalidPixelValue` found.
pub fn encode_tiles(tiles: &[Tile]) -> Result<Vec<u8>, CHRError> {
    let mut ret = Vec::with_capacity(tiles.len() * TILE_BYTES);
    for t in tiles {
        ret.extend_from_slice(&encode_tile(t)?);
    }
    Ok(ret)
}

/// Number of tiles in one bank of the given size.
#[must_use]
pub const fn tile_count_per_bank(size: BankSize) -> usize {
    size.bytes() / TILE_BYTES
}

/// Return the 16 raw bytes for tile `index` inside `bank`.
///
/// # Errors
/// `TileIndexOutOfRange` if the bank doesn't hold that many tiles.
pub fn tile_at(bank: &[u8], index: usize) -> Result<&[u8], CHRError> {
    let count = bank.len() / TILE_BYTES;
    if index >= count {
        return Err(CHRError::TileIndexOutOfRange { index, count });
    }
    Ok(&bank[index * TILE_BYTES..(index + 1) * TILE_BYTES])
}

/// Given a chunk of data (which must be aligned to `size`)
/// parse it and return a list of bitmaps in 8x8 format.
///
/// # Errors
/// If the supplied data is not a whole number of banks this will return an error.
pub fn map_chr_rom(data: &[u8], size: BankSize) -> Result<Vec<Tile>, CHRError> {
    if data.len() % size.bytes() != 0 {
        return Err(CHRError::Misaligned {
            len: data.len(),
            size,
        });
    }
    data.chunks_exact(TILE_BYTES).map(decode_tile).collect()
}

/// Given a tile of data in palette lookup form (0-3 values) return
/// a set of strings describing it where . == background (0) and 1-3
/// for palette lookups.
#[must_use]
pub fn tile_print(tile: &Tile) -> Vec<String> {
    let mut ret = Vec::new();
    for y in 0..TILE_DIM {
        let mut line = String::new();
        for x in 0..TILE_DIM {
            let e = tile.data[y * TILE_DIM + x];
            if e == 0x00 {
                line.push('.');
            } else {
                // Writing to a String can't fail.
                let _ = write!(line, "{e}");
            }
        }
        ret.push(line);
    }
    ret
}
