//! prelude exports the common pieces for working with NES CHR data such as
//! the iNES bank locator, the tile codec, palettes and sprite composition.

/// prelude exports common items for CHR extraction and conversion.
pub mod prelude {
    pub use chr_export::*;
    pub use ines::*;
    pub use nes_chr::*;
    pub use nes_pal::*;
    pub use nes_sprite::*;
}
