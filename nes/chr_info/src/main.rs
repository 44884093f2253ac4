//! `chr_info` takes the path to the given ines file (or raw CHR dump),
//! prints a summary of its CHR data and optionally dumps tiles as text.
use std::fs::read;

use clap::Parser;
use clap_num::maybe_hex;
use color_eyre::eyre::Result;
use ines::{parse_header, BankSize, Container};
use nes_chr::{decode_tile, map_chr_rom, tile_at, tile_count_per_bank, tile_print};

/// `chr_info` will summarize the CHR banks in the given file. With --bank
/// every tile in that bank is printed, with --tile as well only that one.
///
/// Pixel values print as digits with 0 shown as '.'.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(help = "Filename for cart in INES format (or raw CHR with --raw)")]
    filename: String,

    #[arg(long, help = "Bank unit to slice CHR data into (4K or 8K)")]
    bank_size: BankSize,

    #[arg(long, default_value_t = false, help = "Input is a headerless CHR dump")]
    raw: bool,

    #[arg(long, value_parser=maybe_hex::<usize>, help = "Bank to dump")]
    bank: Option<usize>,

    #[arg(long, value_parser=maybe_hex::<usize>, requires = "bank", help = "Single tile within the bank to dump")]
    tile: Option<usize>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();

    let bytes: Vec<u8> = read(&args.filename)?;

    let container = if args.raw {
        Container::Raw
    } else {
        Container::INES
    };
    println!("CHR data for {} ({container})", args.filename);
    if container == Container::INES {
        println!("{}", parse_header(&bytes)?);
    }
    let count = container.bank_count(&bytes, args.bank_size)?;
    println!(
        "{count} {} banks of {} tiles",
        args.bank_size,
        tile_count_per_bank(args.bank_size)
    );

    let Some(b) = args.bank else {
        return Ok(());
    };
    let bank = container.bank_at(&bytes, b, args.bank_size)?;
    if let Some(t) = args.tile {
        println!("\nBank {b} tile {t:#04X}:");
        for l in tile_print(&decode_tile(tile_at(bank, t)?)?) {
            println!("{l}");
        }
        return Ok(());
    }
    for (i, tile) in map_chr_rom(bank, args.bank_size)?.iter().enumerate() {
        println!("\nBank {b} tile {i:#04X}:");
        for l in tile_print(tile) {
            println!("{l}");
        }
    }
    Ok(())
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Args::command().debug_assert();
}
