//! # P1 Bridge Error Handling
//!
//! This module defines the P1Error enum, which represents the different error
//! types that can occur in the p1-zigbee-rs crate.
//!
//! None of these errors is fatal to the bridge: acquisition and checksum failures
//! skip a cycle, request errors drop a single inbound frame and transmit errors
//! drop a single outbound frame.

use std::fmt;
use thiserror::Error;

/// Stage of telegram acquisition in which a timeout budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStage {
    /// Waiting for the `/` start marker.
    Scanning,
    /// Collecting the body until the `!` end marker.
    Body,
    /// Collecting the 4 hex digits of the checksum after `!`.
    Tail,
}

impl fmt::Display for AcquisitionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcquisitionStage::Scanning => "start marker",
            AcquisitionStage::Body => "end marker",
            AcquisitionStage::Tail => "checksum",
        };
        f.write_str(name)
    }
}

/// Represents the different error types that can occur in the P1 bridge.
#[derive(Debug, Error)]
pub enum P1Error {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// A telegram was not completely received within its poll budget.
    #[error("Telegram acquisition timed out waiting for {stage}")]
    AcquisitionTimeout { stage: AcquisitionStage },

    /// The telegram's trailing checksum does not match its content.
    #[error("Invalid checksum: expected {expected:04X}, calculated {calculated:04X}")]
    ChecksumMismatch { expected: u16, calculated: u16 },

    /// The telegram is structurally unusable (no checksum field, non-hex checksum).
    #[error("Invalid telegram: {0}")]
    InvalidTelegram(String),

    /// A parsed value does not fit the byte width of its target attribute.
    #[error("Value {value} of {obis} does not fit in {width} bytes")]
    ValueOverflow {
        obis: &'static str,
        value: u64,
        width: usize,
    },

    /// A value could not be decoded or does not match its attribute type.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The attribute is not present in the attribute store.
    #[error("Unsupported attribute: 0x{0:04X}")]
    UnsupportedAttribute(u16),

    /// An inbound frame was too short or carried an unknown command.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The frame transport refused or failed to send a frame.
    #[error("Transmit failure: {0}")]
    TransmitFailure(String),

    /// The configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
