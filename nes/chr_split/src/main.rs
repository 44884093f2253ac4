//! `chr_split` slices a pre-rendered sheet or map PNG into equal cells and
//! keeps one copy of each distinct cell.
use chr_export::{export_unique_tiles, CATALOG_FILE};
use clap::Parser;
use clap_num::maybe_hex;
use color_eyre::eyre::Result;
use log::info;
use std::fs::create_dir_all;
use std::path::PathBuf;

/// `chr_split` will load the given PNG, cut it into square cells and write
/// the unique cells as a tileset PNG plus a JSON catalog listing every
/// position each cell appeared at.
///
/// Partial cells on the right and bottom edges are ignored.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(help = "PNG sheet or map to split")]
    filename: PathBuf,

    #[arg(
        long, default_value_t = 16, value_parser=maybe_hex::<usize>,
        help = "Width and height of a cell in pixels"
    )]
    cell: usize,

    #[arg(
        long, default_value_t = 16, value_parser=maybe_hex::<usize>,
        help = "Cells per row in the tileset"
    )]
    columns: usize,

    #[arg(long, default_value = "tiles_out", help = "Directory to write into")]
    out: PathBuf,

    #[arg(
        long,
        default_value_t = false,
        help = "Also write each unique cell as its own PNG"
    )]
    tiles: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();

    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    create_dir_all(&args.out)?;
    let catalog = export_unique_tiles(
        &args.filename,
        args.cell,
        args.columns,
        &args.out,
        args.tiles,
    )?;

    let path = args.out.join(CATALOG_FILE);
    catalog.write(&path)?;
    info!("Catalog written to {}", path.display());
    // First entry is the tileset itself.
    println!(
        "Found {} unique {}x{} cells in {} (written to {})",
        catalog.entries.len().saturating_sub(1),
        args.cell,
        args.cell,
        args.filename.display(),
        args.out.display()
    );
    Ok(())
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Args::command().debug_assert();
}
