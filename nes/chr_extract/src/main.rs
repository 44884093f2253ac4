//! `chr_extract` takes an NES cart (or a raw CHR dump) and writes every
//! CHR bank out as a PNG sheet along with a JSON catalog of what was written.
use chr_export::{export_banks, load_palette, CATALOG_FILE};
use clap::Parser;
use clap_num::maybe_hex;
use color_eyre::eyre::Result;
use ines::{BankSize, Container};
use log::info;
use std::fs::{create_dir_all, read};
use std::path::PathBuf;

/// `chr_extract` will load the given cart and render each CHR bank into a
/// 16 tile wide PNG sheet.
///
/// Run with `RUST_LOG=info` to see each file as it's written.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(help = "Filename for cart in INES format (or raw CHR with --raw)")]
    filename: String,

    #[arg(long, help = "Bank unit to slice CHR data into (4K or 8K)")]
    bank_size: BankSize,

    #[arg(long, default_value_t = false, help = "Input is a headerless CHR dump")]
    raw: bool,

    #[arg(long, default_value = "chr_out", help = "Directory to write into")]
    out: PathBuf,

    #[arg(
        long,
        default_value_t = false,
        help = "Also write each tile as its own 8x8 PNG"
    )]
    tiles: bool,

    #[arg(long, help = "Filename containing .pal data to color tiles with")]
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
    let bytes = read(&args.filename)?;
    let container = if args.raw {
        Container::Raw
    } else {
        Container::INES
    };

    create_dir_all(&args.out)?;
    let (catalog, errors) = export_banks(
        &args.filename,
        container,
        &bytes,
        args.bank_size,
        &palette,
        &args.out,
        args.tiles,
    )?;

    // Whatever did get written still gets cataloged.
    let path = args.out.join(CATALOG_FILE);
    catalog.write(&path)?;
    info!("Catalog written to {}", path.display());
    println!(
        "Extracted {} images from {} into {}",
        catalog.entries.len(),
        args.filename,
        args.out.display()
    );
    errors.into_result()?;
    Ok(())
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Args::command().debug_assert();
}
