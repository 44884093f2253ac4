use crate::{
    bank_at, bank_count, banks, chr_region, parse_header, raw_bank_at, raw_bank_count, BankSize,
    Container, Header, INESError, CHR_BLOCK_SIZE, HEADER_SIZE, PRG_BLOCK_SIZE, TRAINER_SIZE,
};
use color_eyre::eyre::Result;
use std::str::FromStr;
use strum::IntoEnumIterator;

// Build a cart image where every CHR byte is its bank number (in 4K units)
// so slices can be identified by content.
fn make_rom(prg: u8, chr: u8, flags6: u8) -> Vec<u8> {
    let mut data = vec![b'N', b'E', b'S', 0x1A, prg, chr, flags6];
    data.resize(HEADER_SIZE, 0x00);
    if flags6 & 0x04 != 0x00 {
        data.resize(data.len() + TRAINER_SIZE, 0xEE);
    }
    data.resize(data.len() + usize::from(prg) * PRG_BLOCK_SIZE, 0xFF);
    for half in 0..usize::from(chr) * 2 {
        #[allow(clippy::cast_possible_truncation)]
        data.resize(data.len() + 4_096, half as u8);
    }
    data
}

#[test]
fn header_fields() -> Result<()> {
    let rom = make_rom(2, 1, 0x14);
    let header = parse_header(&rom)?;
    let want = Header {
        prg_blocks: 2,
        chr_blocks: 1,
        trainer: true,
        mapper: 1,
    };
    assert!(header == want, "Got {header:?} want {want:?}");
    assert!(
        header.chr_offset() == HEADER_SIZE + TRAINER_SIZE + 2 * PRG_BLOCK_SIZE,
        "bad offset {}",
        header.chr_offset()
    );
    assert!(header.chr_len() == CHR_BLOCK_SIZE, "bad len {}", header.chr_len());

    let text = header.to_string();
    assert!(text.contains("at offset 0x8210"), "summary: {text}");
    assert!(text.ends_with("Mapper: 1"), "summary: {text}");
    Ok(())
}

#[test]
fn bank_partitioning() -> Result<()> {
    let rom = make_rom(1, 2, 0x00);

    assert!(
        bank_count(&rom, BankSize::Chr8K)? == 2,
        "wrong 8K bank count"
    );
    let bank0 = bank_at(&rom, 0, BankSize::Chr8K)?;
    assert!(bank0 == &rom[16_400..24_592], "bank 0 isn't [16400, 24592)");
    let bank1 = bank_at(&rom, 1, BankSize::Chr8K)?;
    assert!(bank1 == &rom[24_592..32_784], "bank 1 isn't [24592, 32784)");

    let res = bank_at(&rom, 2, BankSize::Chr8K);
    assert!(
        res == Err(INESError::BankOutOfRange {
            index: 2,
            count: 2,
            size: BankSize::Chr8K
        }),
        "bank 2 didn't fail correctly: {res:?}"
    );
    Ok(())
}

#[test]
fn half_banks() -> Result<()> {
    let rom = make_rom(1, 2, 0x00);

    assert!(
        bank_count(&rom, BankSize::Chr4K)? == 4,
        "wrong 4K bank count"
    );
    for i in 0..4 {
        let bank = bank_at(&rom, i, BankSize::Chr4K)?;
        assert!(bank.len() == 4_096, "bank {i} is {} bytes", bank.len());
        #[allow(clippy::cast_possible_truncation)]
        let want = i as u8;
        assert!(
            bank.iter().all(|b| *b == want),
            "bank {i} has content from another bank"
        );
    }
    assert!(
        bank_at(&rom, 4, BankSize::Chr4K).is_err(),
        "4K bank 4 should be out of range"
    );

    let all: Vec<&[u8]> = banks(&rom, BankSize::Chr4K)?.collect();
    assert!(all.len() == 4, "iterator returned {} banks", all.len());
    Ok(())
}

#[test]
fn trainer_moves_chr() -> Result<()> {
    let rom = make_rom(1, 1, 0x04);
    let chr = chr_region(&rom)?;
    assert!(chr.len() == CHR_BLOCK_SIZE, "wrong CHR len {}", chr.len());
    assert!(chr[0] == 0x00, "CHR starts inside the trainer or PRG");
    assert!(chr[CHR_BLOCK_SIZE - 1] == 0x01, "CHR ends early");
    Ok(())
}

#[test]
fn bad_roms() {
    let res = parse_header(b"XXXX\x01\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
    assert!(
        matches!(res, Err(INESError::InvalidROMHeader { .. })),
        "XXXX header parsed? - {res:?}"
    );

    let mut rom = make_rom(1, 1, 0x00);
    rom[0] = b'X';
    rom[1] = b'X';
    rom[2] = b'X';
    rom[3] = b'X';
    let res = bank_at(&rom, 0, BankSize::Chr8K);
    assert!(
        matches!(res, Err(INESError::InvalidROMHeader { .. })),
        "bank_at accepted XXXX header - {res:?}"
    );

    let res = parse_header(b"NES\x1A");
    assert!(
        matches!(res, Err(INESError::InvalidROMHeader { .. })),
        "short header parsed? - {res:?}"
    );

    let rom = make_rom(1, 0, 0x00);
    let res = chr_region(&rom);
    assert!(
        res == Err(INESError::UnsupportedCHRRAM),
        "CHR-RAM cart not flagged - {res:?}"
    );

    let mut rom = make_rom(1, 1, 0x00);
    rom.truncate(rom.len() - 1);
    let res = chr_region(&rom);
    assert!(
        matches!(res, Err(INESError::Truncated { .. })),
        "truncated cart not flagged - {res:?}"
    );
}

#[test]
fn raw_dumps() -> Result<()> {
    let mut data = vec![0x11; 4_096];
    data.resize(8_192, 0x22);

    assert!(raw_bank_count(&data, BankSize::Chr4K)? == 2, "want 2 4K banks");
    assert!(raw_bank_count(&data, BankSize::Chr8K)? == 1, "want 1 8K bank");
    let bank = raw_bank_at(&data, 1, BankSize::Chr4K)?;
    assert!(bank.iter().all(|b| *b == 0x22), "wrong raw bank returned");

    let res = raw_bank_count(&data[..100], BankSize::Chr4K);
    assert!(
        matches!(res, Err(INESError::Misaligned { len: 100, .. })),
        "misaligned data accepted - {res:?}"
    );

    let half = &data[..4_096];
    assert!(
        raw_bank_count(half, BankSize::Chr8K).is_err(),
        "4K of data isn't an 8K bank"
    );
    Ok(())
}

#[test]
fn containers() -> Result<()> {
    let rom = make_rom(1, 1, 0x00);
    let raw = chr_region(&rom)?.to_vec();

    for size in BankSize::iter() {
        let a = Container::INES.bank_count(&rom, size)?;
        let b = Container::Raw.bank_count(&raw, size)?;
        assert!(a == b, "{size}: INES count {a} != raw count {b}");
        for i in 0..a {
            assert!(
                Container::INES.bank_at(&rom, i, size)? == Container::Raw.bank_at(&raw, i, size)?,
                "{size}: bank {i} differs between containers"
            );
        }
    }
    Ok(())
}

#[test]
fn bank_size_names() -> Result<()> {
    for size in BankSize::iter() {
        let parsed = BankSize::from_str(&size.to_string())?;
        assert!(parsed == size, "{size} didn't round trip through its name");
    }
    assert!(BankSize::from_str("4k")? == BankSize::Chr4K, "lower case 4k");
    assert!(BankSize::from_str("2K").is_err(), "2K isn't a bank size");
    assert!(BankSize::Chr4K.bytes() * 2 == BankSize::Chr8K.bytes(), "sizes");
    Ok(())
}
