//! # P1 Telegram Checksum
//!
//! DSMR 4+ telegrams end with `!XXXX`, where `XXXX` is the CRC-16 of every byte
//! from the `/` start marker up to and including the `!` end marker.
//!
//! The algorithm is CRC-16/ARC: reflected polynomial 0xA001, initial value
//! 0x0000, no final XOR. The 256-entry lookup table is built at compile time.

/// Reflected CRC-16 polynomial used by P1 telegrams
pub const P1_CRC_POLY: u16 = 0xA001;

/// Initial value for the telegram checksum
const P1_CRC_INIT: u16 = 0x0000;

/// Lookup table for the telegram checksum
pub static CRC_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ P1_CRC_POLY;
            } else {
                crc >>= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Calculate the P1 checksum over a byte range.
pub fn checksum(data: &[u8]) -> u16 {
    data.iter().fold(P1_CRC_INIT, |crc, &byte| {
        CRC_TABLE[((crc ^ byte as u16) & 0xFF) as usize] ^ (crc >> 8)
    })
}
