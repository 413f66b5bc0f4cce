//! Object identifier (OBIS) table of the telegram lines the bridge understands.
//!
//! Each entry maps an exact object identifier to how its value is extracted and
//! which attribute receives it. Values are fixed point: the meter's display
//! precision is the implicit scale, so `000004.426*kWh` becomes `4426`.

use crate::zigbee::attribute::AttributeKey;
use crate::zigbee::meter::{self, MeasurementType};

/// Where the value of a recognized line sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// `id(value*unit)`
    FirstGroup,
    /// `id(timestamp)(value*unit)`
    SecondGroup,
    /// Recognized but not turned into an attribute.
    Reserved,
}

/// One recognized telegram line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObisEntry {
    pub obis: &'static str,
    pub extract: Extract,
    pub target: Option<AttributeKey>,
    /// Byte width of the little-endian attribute value.
    pub width: usize,
    /// Phase bits recorded whenever the line is seen.
    pub phase: MeasurementType,
}

const fn entry(obis: &'static str, target: AttributeKey, width: usize) -> ObisEntry {
    ObisEntry {
        obis,
        extract: Extract::FirstGroup,
        target: Some(target),
        width,
        phase: MeasurementType::empty(),
    }
}

const fn phase_entry(
    obis: &'static str,
    target: AttributeKey,
    phase: MeasurementType,
) -> ObisEntry {
    ObisEntry {
        obis,
        extract: Extract::FirstGroup,
        target: Some(target),
        width: 2,
        phase,
    }
}

const fn reserved(obis: &'static str) -> ObisEntry {
    ObisEntry {
        obis,
        extract: Extract::Reserved,
        target: None,
        width: 0,
        phase: MeasurementType::empty(),
    }
}

const NONE: MeasurementType = MeasurementType::empty();
const L2: MeasurementType = MeasurementType::PHASE_B;
const L3: MeasurementType = MeasurementType::PHASE_C;

pub const OBIS_TABLE: &[ObisEntry] = &[
    // Energy registers, kWh with 3 decimals
    entry("1-0:1.8.1", meter::ENERGY_T1_DELIVERED, 6),
    entry("1-0:1.8.2", meter::ENERGY_T2_DELIVERED, 6),
    entry("1-0:2.8.1", meter::ENERGY_T1_RECEIVED, 6),
    entry("1-0:2.8.2", meter::ENERGY_T2_RECEIVED, 6),
    // Instantaneous total import/export power
    reserved("1-0:1.7.0"),
    reserved("1-0:2.7.0"),
    // Currents, A with 2 decimals
    phase_entry("1-0:31.7.0", meter::L1_CURRENT, NONE),
    phase_entry("1-0:51.7.0", meter::L2_CURRENT, L2),
    phase_entry("1-0:71.7.0", meter::L3_CURRENT, L3),
    // Voltages, V with 1 decimal
    phase_entry("1-0:32.7.0", meter::L1_VOLTAGE, NONE),
    phase_entry("1-0:52.7.0", meter::L2_VOLTAGE, L2),
    phase_entry("1-0:72.7.0", meter::L3_VOLTAGE, L3),
    // Phase import power, kW with 3 decimals (W)
    phase_entry("1-0:21.7.0", meter::L1_POWER, NONE),
    phase_entry("1-0:41.7.0", meter::L2_POWER, L2),
    phase_entry("1-0:61.7.0", meter::L3_POWER, L3),
    // Gas volume, m3 with 3 decimals, preceded by the reading timestamp
    ObisEntry {
        obis: "0-1:24.2.1",
        extract: Extract::SecondGroup,
        target: Some(meter::GAS_SUM),
        width: 6,
        phase: NONE,
    },
];

/// Telegram timestamp
pub const OBIS_TIMESTAMP: &str = "0-0:1.0.0";
/// DSMR protocol version
pub const OBIS_VERSION: &str = "1-3:0.2.8";

/// Finds the table entry for an exact object identifier.
pub fn lookup(obis: &str) -> Option<&'static ObisEntry> {
    OBIS_TABLE.iter().find(|entry| entry.obis == obis)
}
