use crate::{
    decode_tile, encode_tile, encode_tiles, map_chr_rom, tile_at, tile_count_per_bank, tile_print,
    CHRError, Tile, TILE_BYTES,
};
use color_eyre::eyre::Result;
use ines::BankSize;
use rand::Rng;

// A tile with bits set in every column of both planes.
const TILE: [u8; 16] = [
    0x41, 0xC2, 0x44, 0x48, 0x10, 0x20, 0x40, 0x80, 0x01, 0x02, 0x04, 0x08, 0x16, 0x21, 0x42, 0x87,
];

const WANT: [u8; 64] = [
    0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00,
    0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x03, 0x00, 0x02, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x02,
    0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x02, 0x02, 0x02,
];

fn check_tile(got: &Tile, want: &Tile) {
    if got != want {
        println!("Tiles differ");
        println!("Want:");
        for l in tile_print(want) {
            println!("{l}");
        }
        println!("\nGot:");
        for l in tile_print(got) {
            println!("{l}");
        }
        panic!();
    }
}

#[test]
fn invalid_chr() {
    let data: [u8; 6] = [0, 1, 2, 3, 4, 5];

    let res = map_chr_rom(&data, BankSize::Chr4K);
    assert!(res.is_err(), "result isn't error? {res:?}");

    let res = decode_tile(&data);
    assert!(
        res == Err(CHRError::MalformedInput { len: 6 }),
        "short tile decoded? {res:?}"
    );

    let res = decode_tile(&[0; 17]);
    assert!(
        res == Err(CHRError::MalformedInput { len: 17 }),
        "long tile decoded? {res:?}"
    );
}

#[test]
fn parse_tile() -> Result<()> {
    let tile = decode_tile(&TILE)?;
    check_tile(&tile, &Tile { data: WANT });

    // Same thing through the bank level decode with only the first tile set.
    let mut data = [0_u8; 4_096];
    data[..TILE.len()].copy_from_slice(&TILE);
    let tiles = map_chr_rom(&data, BankSize::Chr4K)?;
    assert!(tiles.len() == 256, "got {} tiles", tiles.len());
    check_tile(&tiles[0], &Tile { data: WANT });
    check_tile(&tiles[1], &Tile::default());
    Ok(())
}

#[test]
fn bit_order() -> Result<()> {
    let mut data = [0_u8; 16];
    data[0] = 0x80;
    let tile = decode_tile(&data)?;

    let mut want = Tile::default();
    want.set_pixel(0, 0, 1);
    check_tile(&tile, &want);

    // High plane only for the last pixel of the last row.
    let mut data = [0_u8; 16];
    data[15] = 0x01;
    let tile = decode_tile(&data)?;
    let mut want = Tile::default();
    want.set_pixel(7, 7, 2);
    check_tile(&tile, &want);
    Ok(())
}

#[test]
fn encode_known() -> Result<()> {
    let got = encode_tile(&Tile { data: WANT })?;
    assert!(got == TILE, "Got {got:02X?}\nWant {TILE:02X?}");
    Ok(())
}

#[test]
fn single_bits_round_trip() -> Result<()> {
    // Every single set bit in the 16 bytes maps to exactly one pixel.
    for byte in 0..TILE_BYTES {
        for bit in 0..8 {
            let mut data = [0_u8; 16];
            data[byte] = 1 << bit;
            let tile = decode_tile(&data)?;
            let set = tile.data.iter().filter(|p| **p != 0).count();
            assert!(set == 1, "byte {byte} bit {bit} set {set} pixels");
            let back = encode_tile(&tile)?;
            assert!(back == data, "byte {byte} bit {bit}: {back:02X?}");
        }
    }
    Ok(())
}

#[test]
fn random_round_trip() -> Result<()> {
    let mut rng = rand::thread_rng();
    for _ in 0..10_000 {
        let data: [u8; 16] = rng.gen();
        let back = encode_tile(&decode_tile(&data)?)?;
        assert!(back == data, "bytes didn't round trip: {data:02X?} -> {back:02X?}");
    }

    for _ in 0..10_000 {
        let mut tile = Tile::default();
        for p in &mut tile.data {
            *p = rng.gen_range(0..4);
        }
        let back = decode_tile(&encode_tile(&tile)?)?;
        check_tile(&back, &tile);
    }
    Ok(())
}

#[test]
fn encode_rejects_bad_pixels() {
    let mut tile = Tile::default();
    tile.set_pixel(3, 5, 4);
    let res = encode_tile(&tile);
    assert!(
        res == Err(CHRError::InvalidPixelValue {
            row: 3,
            col: 5,
            value: 4
        }),
        "pixel value 4 encoded? {res:?}"
    );

    let res = encode_tiles(&[Tile::default(), tile]);
    assert!(res.is_err(), "bad tile in a run encoded? {res:?}");
}

#[test]
fn bank_tiles() -> Result<()> {
    assert!(tile_count_per_bank(BankSize::Chr4K) == 256, "4K bank");
    assert!(tile_count_per_bank(BankSize::Chr8K) == 512, "8K bank");

    let mut bank = vec![0_u8; BankSize::Chr4K.bytes()];
    bank[255 * 16..].copy_from_slice(&TILE);

    let raw = tile_at(&bank, 255)?;
    assert!(raw == TILE, "tile 255 is {raw:02X?}");
    let res = tile_at(&bank, 256);
    assert!(
        res == Err(CHRError::TileIndexOutOfRange {
            index: 256,
            count: 256
        }),
        "tile 256 of a 4K bank? {res:?}"
    );

    let res = map_chr_rom(&bank, BankSize::Chr8K);
    assert!(res.is_err(), "4K of data decoded as an 8K bank? {res:?}");
    Ok(())
}

#[test]
fn encode_run() -> Result<()> {
    let tiles = vec![Tile { data: WANT }, Tile::default(), Tile { data: WANT }];
    let data = encode_tiles(&tiles)?;
    assert!(data.len() == 48, "wrong length {}", data.len());
    assert!(data[..16] == TILE && data[32..] == TILE, "tiles out of order");
    assert!(data[16..32].iter().all(|b| *b == 0), "blank tile isn't blank");
    Ok(())
}

#[test]
fn flips() {
    let tile = Tile { data: WANT };
    let h = tile.flipped(true, false);
    let v = tile.flipped(false, true);
    for y in 0..8 {
        for x in 0..8 {
            assert!(h.pixel(y, x) == tile.pixel(y, 7 - x), "h flip at {y},{x}");
            assert!(v.pixel(y, x) == tile.pixel(7 - y, x), "v flip at {y},{x}");
        }
    }
    check_tile(&tile.flipped(true, true).flipped(true, true), &tile);
    check_tile(&tile.flipped(false, false), &tile);
}

#[test]
fn rows_and_print() {
    let tile = Tile { data: WANT };
    check_tile(&Tile::from_rows(tile.rows()), &tile);

    let lines = tile_print(&tile);
    assert!(lines.len() == 8, "want 8 lines");
    assert!(lines[0] == ".1.....3", "row 0 is {}", lines[0]);
    assert!(lines[7] == "3....222", "row 7 is {}", lines[7]);
}
