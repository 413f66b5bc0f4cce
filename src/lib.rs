//! # p1-zigbee-rs - DSMR P1 Telegrams as Zigbee Meter Attributes
//!
//! The p1-zigbee-rs crate reads the periodic ASCII telegrams a Dutch/Belgian
//! smart meter sends on its P1 port and publishes the measurements as Zigbee
//! Cluster Library attribute reports (Metering 0x0702 and Electrical
//! Measurement 0x0B04), while answering the descriptor, bind and read-attribute
//! requests a coordinator sends to a metering device.
//!
//! ## Features
//!
//! - Acquire a framed telegram from the serial port with staged poll budgets
//! - Validate the CRC-16 telegram checksum
//! - Parse recognized OBIS lines into fixed-point attribute values with change detection
//! - Encode attribute reports per cluster with a shared sequence number
//! - Answer ZDO descriptor/endpoint/bind requests and ZCL read attributes
//! - Support for logging, statistics and JSON configuration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use p1_zigbee_rs::{BridgeConfig, LogTransport, P1Bridge, P1SerialPort};
//!
//! # async fn example() -> Result<(), p1_zigbee_rs::P1Error> {
//! let config = BridgeConfig::default();
//! let mut bridge = P1Bridge::new(&config)?;
//! let mut port = P1SerialPort::open(&config.serial)?;
//! let mut transport = LogTransport::new();
//! bridge.run_cycle(&mut port, &mut transport).await;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod p1;
pub mod stats;
pub mod util;
pub mod zigbee;

pub use crate::error::{AcquisitionStage, P1Error};
pub use crate::logging::{init_logger, log_info};

pub use bridge::P1Bridge;
pub use config::BridgeConfig;
pub use stats::BridgeStats;

// P1 side
pub use p1::{
    checksum, parse_telegram, read_telegram, verify_checksum, DirtySet, MockTelegramSource,
    P1SerialPort, ParsedTelegram, PublishPolicy, ReaderConfig, SerialConfig, TelegramSource,
};

// Zigbee side
pub use zigbee::{
    meter_attribute_store, meter_endpoints, AttributeDescriptor, AttributeKey, AttributeStore,
    CommandEngine, Destination, DeviceInfo, EndpointDescriptor, FirstRunState, FrameTransport,
    InboundFrame, LogTransport, MockTransport, OutboundFrame, ReportEncoder, ReportSummary,
    ZclDataType,
};

/// Parses a captured telegram into a fresh meter attribute store.
///
/// Everything is reported, as on the first cycle after startup.
pub fn parse_captured_telegram(
    telegram: &[u8],
    device: &DeviceInfo,
) -> Result<(AttributeStore, ParsedTelegram), P1Error> {
    let mut store = meter_attribute_store(device)?;
    let policy = PublishPolicy {
        always_publish: true,
        first_run: true,
    };
    let parsed = parse_telegram(telegram, &mut store, policy)?;
    Ok((store, parsed))
}
