//! `ines` provides utilities for locating the CHR-ROM data inside an INES
//! file and slicing it into banks of a caller chosen size.
//!
//! Only enough of the header is decoded to find the CHR region (PRG size,
//! CHR size and trainer presence). See <https://www.nesdev.org/wiki/INES>
//! for the full format.

use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// `BankSize` is the unit a CHR region is sliced into.
///
/// Tools disagree on what a "bank" is so every call site has to pick one
/// explicitly.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, EnumIter, EnumString)]
pub enum BankSize {
    /// A single 4KB pattern table (256 tiles). This is what the PPU sees
    /// at $0000 or $1000 and the unit MMC1 style boards switch in 4KB CHR mode.
    #[strum(to_string = "4K", serialize = "4k")]
    Chr4K,

    /// A full 8KB CHR-ROM block (512 tiles). This is the unit the INES
    /// header counts in and what NROM/CNROM style boards switch.
    #[strum(to_string = "8K", serialize = "8k")]
    Chr8K,
}

impl BankSize {
    /// The size in bytes of one bank of this type.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Chr4K => 4_096,
            Self::Chr8K => CHR_BLOCK_SIZE,
        }
    }
}

/// `INESError` defines the ways locating CHR data can fail.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum INESError {
    /// The data doesn't start with NES<EOF> or is too short to hold a header.
    #[error("invalid INES header: {reason}")]
    InvalidROMHeader {
        /// Why the header was rejected.
        reason: String,
    },

    /// The cart has no CHR-ROM and instead uses CHR-RAM filled in by code
    /// at runtime so there's nothing to extract.
    #[error("cart uses CHR-RAM (0 CHR-ROM banks) and has no CHR data to decode")]
    UnsupportedCHRRAM,

    /// The requested bank doesn't exist.
    #[error("bank {index} out of range, only {count} {size} banks present")]
    BankOutOfRange {
        /// The requested bank.
        index: usize,
        /// How many banks are available.
        count: usize,
        /// The bank unit in use.
        size: BankSize,
    },

    /// The header claims more data than the file holds.
    #[error("data is {got} bytes but header requires {want}")]
    Truncated {
        /// Bytes required by the header.
        want: usize,
        /// Bytes actually present.
        got: usize,
    },

    /// Raw CHR data which isn't a whole number of banks.
    #[error("raw CHR data length {len} isn't a multiple of {size} banks")]
    Misaligned {
        /// Length of the supplied data.
        len: usize,
        /// The bank unit in use.
        size: BankSize,
    },
}

/// `Header` is the subset of the INES header needed to locate CHR data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// Number of 16KB PRG-ROM blocks.
    pub prg_blocks: usize,

    /// Number of 8KB CHR-ROM blocks. Zero means CHR-RAM.
    pub chr_blocks: usize,

    /// A 512 byte trainer sits between the header and PRG data.
    pub trainer: bool,

    /// Mapper number (low 8 bits from flags 6 and 7).
    pub mapper: u8,
}

impl Header {
    /// Offset of the first CHR byte in the file.
    #[must_use]
    pub fn chr_offset(&self) -> usize {
        let mut off = HEADER_SIZE + self.prg_blocks * PRG_BLOCK_SIZE;
        if self.trainer {
            off += TRAINER_SIZE;
        }
        off
    }

    /// Length of the CHR region in bytes.
    #[must_use]
    pub fn chr_len(&self) -> usize {
        self.chr_blocks * CHR_BLOCK_SIZE
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "PRG-ROM: {} x 16K ({} bytes)",
            self.prg_blocks,
            self.prg_blocks * PRG_BLOCK_SIZE
        )?;
        if self.chr_blocks == 0 {
            writeln!(f, "CHR-ROM: none (CHR-RAM)")?;
        } else {
            writeln!(
                f,
                "CHR-ROM: {} x 8K ({} bytes) at offset {:#X}",
                self.chr_blocks,
                self.chr_len(),
                self.chr_offset()
            )?;
        }
        writeln!(f, "Trainer: {}", self.trainer)?;
        write!(f, "Mapper: {}", self.mapper)
    }
}

const TRAINER_MASK: u8 = 0x04;
const MAPPER_LOW_MASK: u8 = 0xF0;
const MAPPER_HIGH_MASK: u8 = 0xF0;
const MAPPER_LOW_SHIFT: u8 = 4;

/// Size of the INES header.
pub const HEADER_SIZE: usize = 16;

/// Size of one PRG-ROM block as counted by byte 4.
pub const PRG_BLOCK_SIZE: usize = 16_384;

/// Size of one CHR-ROM block as counted by byte 5.
pub const CHR_BLOCK_SIZE: usize = 8_192;

/// Size of the optional trainer.
pub const TRAINER_SIZE: usize = 512;

const SIG: [u8; 4] = [b'N', b'E', b'S', 0x1A];
const PRG_BYTE: usize = 4;
const CHR_BYTE: usize = 5;
const FLAGS_6_BYTE: usize = 6;
const FLAGS_7_BYTE: usize = 7;

/// Parse the INES header at the front of `data`.
///
/// # Errors
/// `InvalidROMHeader` if there aren't 16 bytes or the signature is wrong.
pub fn parse_header(data: &[u8]) -> Result<Header, INESError> {
    if data.len() < HEADER_SIZE {
        return Err(INESError::InvalidROMHeader {
            reason: format!("only {} bytes, need {HEADER_SIZE}", data.len()),
        });
    }
    if data[..SIG.len()] != SIG {
        return Err(INESError::InvalidROMHeader {
            reason: format!(
                "doesn't have NES<EOF> signature, got {:02X?}",
                &data[..SIG.len()]
            ),
        });
    }
    Ok(Header {
        prg_blocks: usize::from(data[PRG_BYTE]),
        chr_blocks: usize::from(data[CHR_BYTE]),
        trainer: data[FLAGS_6_BYTE] & TRAINER_MASK != 0x00,
        mapper: ((data[FLAGS_6_BYTE] & MAPPER_LOW_MASK) >> MAPPER_LOW_SHIFT)
            | (data[FLAGS_7_BYTE] & MAPPER_HIGH_MASK),
    })
}

/// Return the CHR-ROM region of an INES file.
///
/// # Errors
/// Header errors from `parse_header`, `UnsupportedCHRRAM` if the cart has
/// no CHR-ROM and `Truncated` if the data is shorter than the header claims.
pub fn chr_region(data: &[u8]) -> Result<&[u8], INESError> {
    let header = parse_header(data)?;
    if header.chr_blocks == 0 {
        return Err(INESError::UnsupportedCHRRAM);
    }
    let start = header.chr_offset();
    let end = start + header.chr_len();
    if data.len() < end {
        return Err(INESError::Truncated {
            want: end,
            got: data.len(),
        });
    }
    Ok(&data[start..end])
}

/// Number of banks of `size` in the CHR region of an INES file.
///
/// # Errors
/// Same as `chr_region`.
pub fn bank_count(data: &[u8], size: BankSize) -> Result<usize, INESError> {
    Ok(chr_region(data)?.len() / size.bytes())
}

/// Return bank `index` (zero based) of the CHR region in an INES file.
///
/// # Errors
/// Same as `chr_region` plus `BankOutOfRange` for an index past the end.
pub fn bank_at(data: &[u8], index: usize, size: BankSize) -> Result<&[u8], INESError> {
    slice_bank(chr_region(data)?, index, size)
}

/// Number of banks of `size` in a headerless CHR dump (.chr/.bin).
///
/// # Errors
/// `Misaligned` if the data isn't a whole number of banks.
pub fn raw_bank_count(data: &[u8], size: BankSize) -> Result<usize, INESError> {
    if data.len() % size.bytes() != 0 {
        return Err(INESError::Misaligned {
            len: data.len(),
            size,
        });
    }
    Ok(data.len() / size.bytes())
}

/// Return bank `index` of a headerless CHR dump.
///
/// # Errors
/// `Misaligned` as in `raw_bank_count` or `BankOutOfRange`.
pub fn raw_bank_at(data: &[u8], index: usize, size: BankSize) -> Result<&[u8], INESError> {
    raw_bank_count(data, size)?;
    slice_bank(data, index, size)
}

/// Iterate over every bank of `size` in an INES file in order.
///
/// # Errors
/// Same as `chr_region`.
pub fn banks(data: &[u8], size: BankSize) -> Result<std::slice::ChunksExact<'_, u8>, INESError> {
    Ok(chr_region(data)?.chunks_exact(size.bytes()))
}

// The CHR region is always a multiple of 8K so both bank sizes divide it.
fn slice_bank(chr: &[u8], index: usize, size: BankSize) -> Result<&[u8], INESError> {
    let count = chr.len() / size.bytes();
    if index >= count {
        return Err(INESError::BankOutOfRange { index, count, size });
    }
    let start = index * size.bytes();
    Ok(&chr[start..start + size.bytes()])
}

/// `Container` describes how CHR data is stored in a file handed to a tool.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Container {
    /// An INES cart image with a header, PRG and then CHR data.
    INES,

    /// A headerless dump of CHR data only (.chr/.bin).
    Raw,
}

impl Container {
    /// Return the whole CHR region for this container.
    ///
    /// # Errors
    /// See `chr_region` and `raw_bank_count`.
    pub fn chr(self, data: &[u8], size: BankSize) -> Result<&[u8], INESError> {
        match self {
            Self::INES => chr_region(data),
            Self::Raw => {
                raw_bank_count(data, size)?;
                Ok(data)
            }
        }
    }

    /// Number of banks of `size` in the container.
    ///
    /// # Errors
    /// See `chr`.
    pub fn bank_count(self, data: &[u8], size: BankSize) -> Result<usize, INESError> {
        Ok(self.chr(data, size)?.len() / size.bytes())
    }

    /// Return bank `index` from the container.
    ///
    /// # Errors
    /// See `chr` plus `BankOutOfRange`.
    pub fn bank_at(self, data: &[u8], index: usize, size: BankSize) -> Result<&[u8], INESError> {
        slice_bank(self.chr(data, size)?, index, size)
    }
}
