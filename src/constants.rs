//! Zigbee and DSMR Protocol Constants
//!
//! This module defines constants used by the telegram reader and the Zigbee
//! cluster library (ZCL) / device object (ZDO) handling, based on the DSMR P1
//! companion standard and the Zigbee Cluster Library specification.

// ----------------------------------------------------------------------------
// DSMR P1 telegram framing
// ----------------------------------------------------------------------------

/// Telegram start marker
pub const P1_START_MARKER: u8 = b'/';

/// Telegram end marker, followed by the checksum
pub const P1_END_MARKER: u8 = b'!';

/// Number of hex digits in the trailing checksum
pub const P1_CHECKSUM_DIGITS: usize = 4;

/// Line separator inside a telegram
pub const P1_LINE_SEPARATOR: &str = "\r\n";

// ----------------------------------------------------------------------------
// Profiles
// ----------------------------------------------------------------------------

/// Zigbee device profile (ZDO)
pub const PROFILE_ZDO: u16 = 0x0000;

/// Home Automation profile
pub const PROFILE_HOME_AUTOMATION: u16 = 0x0104;

// ----------------------------------------------------------------------------
// Clusters
// ----------------------------------------------------------------------------

pub const CLUSTER_BASIC: u16 = 0x0000;
pub const CLUSTER_METERING: u16 = 0x0702;
pub const CLUSTER_ELECTRICAL_MEASUREMENT: u16 = 0x0B04;

// ----------------------------------------------------------------------------
// Endpoints
// ----------------------------------------------------------------------------

/// ZDO endpoint
pub const ENDPOINT_ZDO: u8 = 0;
/// Electricity meter endpoint
pub const ENDPOINT_ELECTRICITY: u8 = 1;
/// Gas meter endpoint
pub const ENDPOINT_GAS: u8 = 2;

/// Device id advertised by both meter endpoints
pub const DEVICE_ID_METER: u16 = 0x0007;

// ----------------------------------------------------------------------------
// ZDO requests and responses (the ZDO cluster id is the command)
// ----------------------------------------------------------------------------

pub const ZDO_SIMPLE_DESC_REQ: u16 = 0x0004;
pub const ZDO_ACTIVE_EP_REQ: u16 = 0x0005;
pub const ZDO_BIND_REQ: u16 = 0x0021;
pub const ZDO_UNBIND_REQ: u16 = 0x0022;
pub const ZDO_IEEE_ADDR_RSP: u16 = 0x8001;
pub const ZDO_NODE_DESC_RSP: u16 = 0x8002;

/// Bit set on a ZDO cluster id to form its response cluster
pub const ZDO_RESPONSE_BIT: u16 = 0x8000;

pub const ZDO_STATUS_SUCCESS: u8 = 0x00;
pub const ZDO_STATUS_INVALID_EP: u8 = 0x82;

// ----------------------------------------------------------------------------
// ZCL frame control and general commands
// ----------------------------------------------------------------------------

pub const ZCL_FC_FRAME_TYPE_MASK: u8 = 0x03;
pub const ZCL_FC_MANUFACTURER_SPECIFIC: u8 = 0x04;
pub const ZCL_FC_DIRECTION_SERVER_TO_CLIENT: u8 = 0x08;
pub const ZCL_FC_DISABLE_DEFAULT_RESPONSE: u8 = 0x10;

/// Frame control byte of outbound attribute reports
pub const ZCL_FC_REPORT: u8 = 0x00;
/// Frame control byte of outbound read-attributes responses
pub const ZCL_FC_RESPONSE: u8 = ZCL_FC_DISABLE_DEFAULT_RESPONSE;

/// Minimum ZCL header: frame control, sequence, command id
pub const ZCL_HEADER_LEN: usize = 3;

pub const ZCL_CMD_READ_ATTRIBUTES: u8 = 0x00;
pub const ZCL_CMD_READ_ATTRIBUTES_RSP: u8 = 0x01;
pub const ZCL_CMD_REPORT_ATTRIBUTES: u8 = 0x0A;
pub const ZCL_CMD_DEFAULT_RSP: u8 = 0x0B;

pub const ZCL_STATUS_SUCCESS: u8 = 0x00;
pub const ZCL_STATUS_UNSUPPORTED_ATTRIBUTE: u8 = 0x86;
