//! # Meter Attribute Layout
//!
//! The attributes exposed by the two meter endpoints: electricity on endpoint 1
//! (Metering + Electrical Measurement + Basic) and gas on endpoint 2 (Metering).
//! Static scale attributes carry their fixed values from construction; measured
//! attributes start unset until the first telegram is parsed.

use crate::constants::{
    CLUSTER_BASIC, CLUSTER_ELECTRICAL_MEASUREMENT, CLUSTER_METERING, ENDPOINT_ELECTRICITY,
    ENDPOINT_GAS,
};
use crate::error::P1Error;
use crate::zigbee::attribute::{AttributeDescriptor, AttributeKey, ZclDataType};
use crate::zigbee::store::AttributeStore;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

const fn elec(cluster: u16, attribute: u16) -> AttributeKey {
    AttributeKey::new(ENDPOINT_ELECTRICITY, cluster, attribute)
}

const fn gas(attribute: u16) -> AttributeKey {
    AttributeKey::new(ENDPOINT_GAS, CLUSTER_METERING, attribute)
}

// Metering, electricity endpoint
pub const ENERGY_SUM: AttributeKey = elec(CLUSTER_METERING, 0x0000);
pub const ENERGY_T1_DELIVERED: AttributeKey = elec(CLUSTER_METERING, 0x0100);
pub const ENERGY_T1_RECEIVED: AttributeKey = elec(CLUSTER_METERING, 0x0101);
pub const ENERGY_T2_DELIVERED: AttributeKey = elec(CLUSTER_METERING, 0x0102);
pub const ENERGY_T2_RECEIVED: AttributeKey = elec(CLUSTER_METERING, 0x0103);
pub const ENERGY_STATUS: AttributeKey = elec(CLUSTER_METERING, 0x0200);
pub const ENERGY_UNIT: AttributeKey = elec(CLUSTER_METERING, 0x0300);
pub const ENERGY_MULTIPLIER: AttributeKey = elec(CLUSTER_METERING, 0x0301);
pub const ENERGY_DIVISOR: AttributeKey = elec(CLUSTER_METERING, 0x0302);

// Metering, gas endpoint
pub const GAS_SUM: AttributeKey = gas(0x0000);
pub const GAS_STATUS: AttributeKey = gas(0x0200);
pub const GAS_UNIT: AttributeKey = gas(0x0300);
pub const GAS_MULTIPLIER: AttributeKey = gas(0x0301);
pub const GAS_DIVISOR: AttributeKey = gas(0x0302);

// Electrical measurement
pub const MEASUREMENT_TYPE: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0000);
pub const POWER_TOTAL: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0304);
pub const POWER_MULTIPLIER: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0402);
pub const POWER_DIVISOR: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0403);
pub const L1_VOLTAGE: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0505);
pub const L1_CURRENT: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0508);
pub const L1_POWER: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x050B);
pub const VOLTAGE_MULTIPLIER: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0600);
pub const VOLTAGE_DIVISOR: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0601);
pub const CURRENT_MULTIPLIER: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0602);
pub const CURRENT_DIVISOR: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0603);
pub const L2_VOLTAGE: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0905);
pub const L2_CURRENT: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0908);
pub const L2_POWER: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x090B);
pub const L3_VOLTAGE: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0A05);
pub const L3_CURRENT: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0A08);
pub const L3_POWER: AttributeKey = elec(CLUSTER_ELECTRICAL_MEASUREMENT, 0x0A0B);

/// Scale attributes sent together with the measurement type bitmap.
pub const ELECTRICAL_SCALES: [AttributeKey; 6] = [
    VOLTAGE_MULTIPLIER,
    VOLTAGE_DIVISOR,
    CURRENT_MULTIPLIER,
    CURRENT_DIVISOR,
    POWER_MULTIPLIER,
    POWER_DIVISOR,
];

/// Static metering attributes (status, multiplier, divisor, unit) per endpoint.
pub const ENERGY_STATICS: [AttributeKey; 4] =
    [ENERGY_STATUS, ENERGY_MULTIPLIER, ENERGY_DIVISOR, ENERGY_UNIT];
pub const GAS_STATICS: [AttributeKey; 4] = [GAS_STATUS, GAS_MULTIPLIER, GAS_DIVISOR, GAS_UNIT];

bitflags! {
    /// Electrical Measurement "measurement type" bitmap.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MeasurementType: u32 {
        const ACTIVE_AC = 1 << 0;
        const PHASE_A = 1 << 3;
        const PHASE_B = 1 << 4;
        const PHASE_C = 1 << 5;
    }
}

impl MeasurementType {
    /// Single phase meter: active AC measurement on phase A only.
    pub const SINGLE_PHASE: MeasurementType =
        MeasurementType::ACTIVE_AC.union(MeasurementType::PHASE_A);

    pub fn to_attribute_bytes(self) -> Vec<u8> {
        self.bits().to_le_bytes().to_vec()
    }
}

/// Identity strings of the Basic cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub date_code: String,
    pub sw_build: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        DeviceInfo {
            manufacturer: "consp".to_string(),
            model: "Zigbee P1 Meter".to_string(),
            date_code: "2023-01-15".to_string(),
            sw_build: "v0.1".to_string(),
        }
    }
}

/// Builds the attribute store of both meter endpoints.
pub fn meter_attribute_store(info: &DeviceInfo) -> Result<AttributeStore, P1Error> {
    use ZclDataType::*;

    let mut store = AttributeStore::new();

    // Basic cluster
    let basic = |attribute| elec(CLUSTER_BASIC, attribute);
    store.insert(AttributeDescriptor::with_uint(basic(0x0000), Uint8, 8)?);
    for attribute in 0x0001..=0x0003 {
        store.insert(AttributeDescriptor::with_uint(basic(attribute), Uint8, 0)?);
    }
    store.insert(AttributeDescriptor::with_string(basic(0x0004), &info.manufacturer));
    store.insert(AttributeDescriptor::with_string(basic(0x0005), &info.model));
    store.insert(AttributeDescriptor::with_string(basic(0x0006), &info.date_code));
    // Power source: DC
    store.insert(AttributeDescriptor::with_uint(basic(0x0007), Enum8, 4)?);
    store.insert(AttributeDescriptor::with_uint(basic(0x0008), Enum8, 0)?);
    store.insert(AttributeDescriptor::with_uint(basic(0x0009), Enum8, 0xFF)?);
    store.insert(AttributeDescriptor::with_string(basic(0x4000), &info.sw_build));

    // Metering, electricity in kWh with 3 implicit decimals
    for key in [
        ENERGY_SUM,
        ENERGY_T1_DELIVERED,
        ENERGY_T1_RECEIVED,
        ENERGY_T2_DELIVERED,
        ENERGY_T2_RECEIVED,
    ] {
        store.insert(AttributeDescriptor::unset(key, Uint48));
    }
    store.insert(AttributeDescriptor::with_uint(ENERGY_STATUS, Bitmap8, 0)?);
    store.insert(AttributeDescriptor::with_uint(ENERGY_UNIT, Enum8, 0)?);
    store.insert(AttributeDescriptor::with_uint(ENERGY_MULTIPLIER, Uint24, 1)?);
    store.insert(AttributeDescriptor::with_uint(ENERGY_DIVISOR, Uint24, 1000)?);

    // Metering, gas in m3 with 3 implicit decimals
    store.insert(AttributeDescriptor::unset(GAS_SUM, Uint48));
    store.insert(AttributeDescriptor::with_uint(GAS_STATUS, Bitmap8, 0)?);
    store.insert(AttributeDescriptor::with_uint(GAS_UNIT, Enum8, 1)?);
    store.insert(AttributeDescriptor::with_uint(GAS_MULTIPLIER, Uint24, 1)?);
    store.insert(AttributeDescriptor::with_uint(GAS_DIVISOR, Uint24, 1000)?);

    // Electrical measurement
    store.insert(AttributeDescriptor::with_uint(
        MEASUREMENT_TYPE,
        Bitmap32,
        MeasurementType::SINGLE_PHASE.bits() as u64,
    )?);
    store.insert(AttributeDescriptor::unset(POWER_TOTAL, Int32));
    for key in [
        L1_VOLTAGE, L1_CURRENT, L1_POWER, L2_VOLTAGE, L2_CURRENT, L2_POWER, L3_VOLTAGE,
        L3_CURRENT, L3_POWER,
    ] {
        store.insert(AttributeDescriptor::unset(key, Uint16));
    }
    store.insert(AttributeDescriptor::with_uint(VOLTAGE_MULTIPLIER, Uint16, 1)?);
    store.insert(AttributeDescriptor::with_uint(VOLTAGE_DIVISOR, Uint16, 10)?);
    store.insert(AttributeDescriptor::with_uint(CURRENT_MULTIPLIER, Uint16, 1)?);
    store.insert(AttributeDescriptor::with_uint(CURRENT_DIVISOR, Uint16, 100)?);
    store.insert(AttributeDescriptor::with_uint(POWER_MULTIPLIER, Uint32, 1)?);
    store.insert(AttributeDescriptor::with_uint(POWER_DIVISOR, Uint32, 1)?);

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_phase_bitmap() {
        assert_eq!(MeasurementType::SINGLE_PHASE.bits(), 0b001001);
        assert_eq!(
            (MeasurementType::SINGLE_PHASE | MeasurementType::PHASE_B | MeasurementType::PHASE_C)
                .to_attribute_bytes(),
            vec![0x39, 0, 0, 0]
        );
    }

    #[test]
    fn test_meter_store_layout() {
        let store = meter_attribute_store(&DeviceInfo::default()).unwrap();
        assert_eq!(store.uint(&ENERGY_DIVISOR), Some(1000));
        assert_eq!(store.uint(&GAS_UNIT), Some(1));
        assert_eq!(store.uint(&MEASUREMENT_TYPE), Some(0b001001));
        assert!(!store.get(&ENERGY_T1_DELIVERED).unwrap().is_set());
        assert_eq!(
            store.get(&POWER_TOTAL).unwrap().data_type(),
            ZclDataType::Int32
        );
        assert_eq!(
            store.lookup(1, CLUSTER_BASIC, 0x0005).unwrap().value(),
            Some(&b"Zigbee P1 Meter"[..])
        );
        assert!(store.lookup(2, CLUSTER_BASIC, 0x0005).is_err());
    }
}
