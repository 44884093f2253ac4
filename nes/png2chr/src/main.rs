//! `png2chr` converts PNG art into raw CHR data suitable for including
//! directly in a cart build.
use chr_export::{load_palette, pngs_to_chr, TileOrder};
use clap::Parser;
use clap_num::maybe_hex;
use color_eyre::eyre::Result;
use log::warn;
use nes_chr::TILE_BYTES;
use nes_pal::{Brightness, NearestColor, Quantizer};
use std::fs::write;
use std::path::PathBuf;
use strum_macros::{Display, EnumString};

/// How colors in the art are mapped back to pixel values.
#[derive(Clone, Copy, Debug, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
enum QuantizerKind {
    /// Quarters of the RGB mean. Intended for grayscale art.
    Brightness,

    /// Closest palette entry (grayscale unless --pal is given).
    Nearest,
}

/// `png2chr` will load each PNG, split it into 8x8 tiles and write the
/// concatenated CHR encoding of all of them to the output.
///
/// Images whose size isn't a multiple of 8 are padded with pixel value 0.
/// The output is only written if every input converts.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(required = true, help = "PNG files to convert, in output order")]
    inputs: Vec<PathBuf>,

    #[arg(long, help = "Filename to write CHR data to")]
    output: PathBuf,

    #[arg(
        long,
        default_value_t = false,
        help = "Treat images as 16x16 sprites emitting TL, TR, BL, BR for each"
    )]
    sprite_mode: bool,

    #[arg(long, default_value_t = QuantizerKind::Brightness, help = "How to pick pixel values (brightness or nearest)")]
    quantizer: QuantizerKind,

    #[arg(long, help = "Filename containing .pal data for the nearest quantizer")]
    pal: Option<PathBuf>,

    #[arg(
        long, value_delimiter = ',', value_parser=maybe_hex::<u8>, requires = "pal",
        help = "4 comma separated entries from the .pal file for pixel values 0-3"
    )]
    colors: Option<Vec<u8>>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();

    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let palette = load_palette(args.pal.as_deref(), args.colors.as_deref())?;
    let nearest = NearestColor(palette);
    let q: &dyn Quantizer = match args.quantizer {
        QuantizerKind::Brightness => {
            if args.pal.is_some() {
                warn!("--pal has no effect with the brightness quantizer");
            }
            &Brightness
        }
        QuantizerKind::Nearest => &nearest,
    };
    let order = if args.sprite_mode {
        TileOrder::Sprites
    } else {
        TileOrder::Rows
    };

    let (data, errors) = pngs_to_chr(&args.inputs, q, order);
    errors.into_result()?;

    write(&args.output, &data)?;
    println!(
        "Wrote {} tiles ({} bytes) to {}",
        data.len() / TILE_BYTES,
        data.len(),
        args.output.display()
    );
    Ok(())
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Args::command().debug_assert();
}
