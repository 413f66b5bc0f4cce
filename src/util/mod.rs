//! # Utility Modules
//!
//! Hex encoding/decoding and logging helpers shared by the P1 and Zigbee sides.

pub mod hex;
pub mod logging;

pub use hex::{decode_hex, encode_hex, format_hex_compact, pretty_hex};
pub use logging::{log_frame_hex, LogThrottle, ThrottleManager};
