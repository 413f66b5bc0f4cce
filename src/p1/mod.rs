//! The p1 module contains the DSMR P1 side of the bridge: acquiring a framed
//! telegram from the serial port, validating its checksum and parsing its lines
//! into meter attributes.

pub mod crc;
pub mod obis;
pub mod parser;
pub mod reader;
pub mod serial;
pub mod serial_mock;

pub use crc::checksum;
pub use parser::{parse_telegram, verify_checksum, DirtySet, ParsedTelegram, PublishPolicy};
pub use reader::{read_telegram, ReaderConfig, TelegramSource};
pub use serial::{P1SerialPort, SerialConfig};
pub use serial_mock::MockTelegramSource;
