//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers used for frame logging, the CLI (inbound frames are given as
//! hex strings) and tests.
//!
//! ```rust
//! use p1_zigbee_rs::util::hex::{decode_hex, encode_hex, format_hex_compact};
//!
//! let frame = decode_hex("00 2a 00 05 00").unwrap();
//! assert_eq!(encode_hex(&frame), "002a000500");
//! assert_eq!(format_hex_compact(&frame[..3]), "00 2a 00");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Encode bytes to uppercase hex string
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters.
/// Whitespace is automatically stripped.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }
    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Hex dump with offsets and an ASCII column, 16 bytes per line.
///
/// Telegrams are ASCII, so the right column shows their text.
pub fn pretty_hex(data: &[u8]) -> String {
    const BYTES_PER_LINE: usize = 16;

    data.chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(i, chunk)| {
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!(
                "{:04x}: {:<48}|{}|",
                i * BYTES_PER_LINE,
                format_hex_compact(chunk),
                ascii
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "00 2a 0a" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
