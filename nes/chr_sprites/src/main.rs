//! `chr_sprites` composes named multi tile sprites out of one CHR bank
//! using a JSON list of sprite definitions.
use chr_export::{export_sprites, load_palette, read_sprite_defs, CATALOG_FILE};
use clap::Parser;
use clap_num::maybe_hex;
use color_eyre::eyre::Result;
use ines::{BankSize, Container};
use log::info;
use nes_sprite::MissingTile;
use std::fs::{create_dir_all, read};
use std::path::PathBuf;

/// `chr_sprites` will load the given cart and sprite definitions and write a
/// PNG per sprite plus a JSON catalog.
///
/// Definitions are a JSON list of objects with `name`, `base_tile` and
/// optionally `category`, `width`, `height` (tiles, default 2) and
/// `arrangement` (default row major).
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(help = "Filename for cart in INES format (or raw CHR with --raw)")]
    filename: String,

    #[arg(help = "Filename of the sprite definition JSON")]
    defs: PathBuf,

    #[arg(long, help = "Bank unit to slice CHR data into (4K or 8K)")]
    bank_size: BankSize,

    #[arg(long, value_parser=maybe_hex::<usize>, help = "Bank the sprites live in")]
    bank: usize,

    #[arg(long, default_value_t = false, help = "Input is a headerless CHR dump")]
    raw: bool,

    #[arg(long, default_value = "sprites", help = "Directory to write into")]
    out: PathBuf,

    #[arg(
        long,
        default_value_t = MissingTile::Error,
        help = "What to do when a sprite runs off the bank (error or transparent)"
    )]
    fill: MissingTile,

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
    let defs = read_sprite_defs(&args.defs)?;
    let bytes = read(&args.filename)?;
    let container = if args.raw {
        Container::Raw
    } else {
        Container::INES
    };
    let bank = container.bank_at(&bytes, args.bank, args.bank_size)?;

    create_dir_all(&args.out)?;
    let (catalog, errors) = export_sprites(
        &args.filename,
        bank,
        args.bank,
        args.bank_size,
        &palette,
        &defs,
        args.fill,
        &args.out,
    )?;

    let path = args.out.join(CATALOG_FILE);
    catalog.write(&path)?;
    info!("Catalog written to {}", path.display());
    println!(
        "Wrote {} of {} sprites into {}",
        catalog.entries.len(),
        defs.len(),
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
