//! # P1 Telegram Parser
//!
//! Validates a framed telegram and turns its recognized lines into attribute
//! values. The grammar of a data line is handled with `nom`:
//!
//! ```text
//! 1-0:1.8.1(000004.426*kWh)
//! 0-1:24.2.1(170102161005W)(00000.107*m3)
//! ```
//!
//! An object identifier is followed by one or more parenthesized groups; the
//! measured value sits before the `*` unit marker. Digits are taken verbatim with
//! the decimal point removed and stored as a little-endian integer sized to the
//! target attribute.
//!
//! Every changed value (or every value, when the publish policy says so) is
//! marked dirty on its endpoint. Nothing in the store is touched unless the
//! checksum is valid.

use crate::constants::{P1_CHECKSUM_DIGITS, P1_END_MARKER, P1_LINE_SEPARATOR};
use crate::error::P1Error;
use crate::p1::crc::checksum;
use crate::p1::obis::{self, Extract, ObisEntry, OBIS_TIMESTAMP, OBIS_VERSION};
use crate::zigbee::attribute::{uint_le_bytes, AttributeKey};
use crate::zigbee::meter::{self, MeasurementType};
use crate::zigbee::store::AttributeStore;
use chrono::NaiveDateTime;
use log::{debug, trace, warn};
use nom::{
    bytes::complete::take_until,
    character::complete::char,
    combinator::rest,
    multi::many1,
    sequence::{delimited, separated_pair},
    IResult,
};

/// Decides whether unchanged values are reported anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishPolicy {
    /// Report every value on every cycle.
    pub always_publish: bool,
    /// No report has been acknowledged yet.
    pub first_run: bool,
}

impl PublishPolicy {
    pub fn publish_all(&self) -> bool {
        self.always_publish || self.first_run
    }
}

/// Attributes of one endpoint that must be reported, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirtySet {
    endpoint: u8,
    keys: Vec<AttributeKey>,
}

impl DirtySet {
    pub fn new(endpoint: u8) -> Self {
        DirtySet {
            endpoint,
            keys: Vec::new(),
        }
    }

    /// Adds a key once; later marks of the same key keep the first position.
    pub fn mark(&mut self, key: AttributeKey) {
        debug_assert_eq!(key.endpoint, self.endpoint);
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    pub fn endpoint(&self) -> u8 {
        self.endpoint
    }

    pub fn keys(&self) -> &[AttributeKey] {
        &self.keys
    }

    pub fn contains(&self, key: &AttributeKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Result of parsing one telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTelegram {
    pub electricity: DirtySet,
    pub gas: DirtySet,
    /// Telegram timestamp (0-0:1.0.0), daylight saving flag dropped.
    pub timestamp: Option<NaiveDateTime>,
    /// Timestamp of the last gas meter reading.
    pub gas_timestamp: Option<NaiveDateTime>,
    /// DSMR protocol version (1-3:0.2.8).
    pub version: Option<String>,
    /// Recognized lines whose value could not be used.
    pub skipped_lines: usize,
}

impl ParsedTelegram {
    fn new() -> Self {
        ParsedTelegram {
            electricity: DirtySet::new(meter::ENERGY_SUM.endpoint),
            gas: DirtySet::new(meter::GAS_SUM.endpoint),
            timestamp: None,
            gas_timestamp: None,
            version: None,
            skipped_lines: 0,
        }
    }

    pub fn dirty_sets(&self) -> [&DirtySet; 2] {
        [&self.electricity, &self.gas]
    }

    pub fn is_empty(&self) -> bool {
        self.electricity.is_empty() && self.gas.is_empty()
    }

    fn mark(&mut self, key: AttributeKey) {
        if key.endpoint == self.gas.endpoint() {
            self.gas.mark(key);
        } else {
            self.electricity.mark(key);
        }
    }
}

/// Checks the trailing `!XXXX` checksum of a framed telegram.
pub fn verify_checksum(telegram: &[u8]) -> Result<(), P1Error> {
    let split = telegram
        .len()
        .checked_sub(P1_CHECKSUM_DIGITS)
        .filter(|&split| split > 0 && telegram[split - 1] == P1_END_MARKER)
        .ok_or_else(|| P1Error::InvalidTelegram("missing !XXXX checksum field".into()))?;

    let field = &telegram[split..];
    let digits = hex::decode(field).map_err(|_| {
        P1Error::InvalidTelegram(format!(
            "checksum field '{}' is not hex",
            String::from_utf8_lossy(field)
        ))
    })?;
    let expected = u16::from_be_bytes([digits[0], digits[1]]);
    let calculated = checksum(&telegram[..split]);

    if expected != calculated {
        return Err(P1Error::ChecksumMismatch {
            expected,
            calculated,
        });
    }
    Ok(())
}

/// Validates `telegram` and applies its values to `store`.
pub fn parse_telegram(
    telegram: &[u8],
    store: &mut AttributeStore,
    policy: PublishPolicy,
) -> Result<ParsedTelegram, P1Error> {
    verify_checksum(telegram)?;

    let publish_all = policy.publish_all();
    let body = String::from_utf8_lossy(&telegram[..telegram.len() - P1_CHECKSUM_DIGITS]);
    let mut parsed = ParsedTelegram::new();
    let mut phases = MeasurementType::SINGLE_PHASE;

    for line in body.split(P1_LINE_SEPARATOR) {
        let Ok((input, obis)) = obis_code(line) else {
            continue;
        };
        let entry = obis::lookup(obis);
        if let Some(entry) = entry {
            phases |= entry.phase;
        }

        let groups = match cosem_groups(input) {
            Ok((_, groups)) => groups,
            Err(_) if entry.and_then(|e| e.target).is_some() => {
                warn!("Skipping line '{line}': unterminated value group");
                parsed.skipped_lines += 1;
                continue;
            }
            Err(_) => continue,
        };

        match obis {
            OBIS_TIMESTAMP => parsed.timestamp = groups.first().and_then(|g| parse_timestamp(g)),
            OBIS_VERSION => parsed.version = groups.first().map(|g| g.to_string()),
            _ => {}
        }

        let Some(entry) = entry else {
            trace!("Ignoring line {line}");
            continue;
        };
        let Some(target) = entry.target else {
            continue;
        };
        if entry.extract == Extract::SecondGroup {
            parsed.gas_timestamp = groups.first().and_then(|g| parse_timestamp(g));
        }

        match extract_value(entry, &groups) {
            Ok(value) => {
                if apply(store, &target, value) || publish_all {
                    parsed.mark(target);
                }
            }
            Err(e) => {
                warn!("Skipping line '{line}': {e}");
                parsed.skipped_lines += 1;
            }
        }
    }

    if apply(store, &meter::MEASUREMENT_TYPE, phases.to_attribute_bytes()) || publish_all {
        parsed.mark(meter::MEASUREMENT_TYPE);
        for key in meter::ELECTRICAL_SCALES {
            parsed.mark(key);
        }
    }

    // Aggregates are reported whenever they have an input, changed or not.
    let phase_powers = [meter::L1_POWER, meter::L2_POWER, meter::L3_POWER];
    if update_sum(store, &phase_powers, &meter::POWER_TOTAL, 4) {
        parsed.mark(meter::POWER_TOTAL);
    }

    let tariffs = [meter::ENERGY_T1_DELIVERED, meter::ENERGY_T2_DELIVERED];
    if update_sum(store, &tariffs, &meter::ENERGY_SUM, 6) {
        parsed.mark(meter::ENERGY_SUM);
    }

    if publish_all {
        for key in meter::ENERGY_STATICS.into_iter().chain(meter::GAS_STATICS) {
            parsed.mark(key);
        }
    }

    debug!(
        "Parsed telegram {:?}: {} electricity, {} gas attributes dirty, {} lines skipped",
        parsed.timestamp,
        parsed.electricity.len(),
        parsed.gas.len(),
        parsed.skipped_lines
    );
    Ok(parsed)
}

/// Stores a value, returning `true` if it changed. Store errors are logged and ignored.
fn apply(store: &mut AttributeStore, key: &AttributeKey, value: Vec<u8>) -> bool {
    store.update(key, value).unwrap_or_else(|e| {
        warn!("Cannot update {key}: {e}");
        false
    })
}

/// Sums the set inputs into `target`, absent inputs counting as zero.
///
/// Returns `true` once the sum is stored; nothing happens while all inputs are unset.
fn update_sum(
    store: &mut AttributeStore,
    inputs: &[AttributeKey],
    target: &AttributeKey,
    width: usize,
) -> bool {
    let values: Vec<u64> = inputs.iter().filter_map(|key| store.uint(key)).collect();
    if values.is_empty() {
        return false;
    }
    let total: u64 = values.iter().sum();
    let Some(bytes) = uint_le_bytes(total, width) else {
        warn!("Sum {total} does not fit {target}");
        return false;
    };
    match store.update(target, bytes) {
        Ok(_) => true,
        Err(e) => {
            warn!("Cannot update {target}: {e}");
            false
        }
    }
}

fn extract_value(entry: &ObisEntry, groups: &[&str]) -> Result<Vec<u8>, P1Error> {
    let group = match entry.extract {
        Extract::FirstGroup => groups.first(),
        Extract::SecondGroup => groups.get(1),
        Extract::Reserved => None,
    }
    .ok_or_else(|| P1Error::InvalidValue(format!("{} has no value group", entry.obis)))?;

    let (_, (digits, unit)) = measurement(group)
        .map_err(|_| P1Error::InvalidValue(format!("no unit marker in '{group}'")))?;
    let value = fixed_point(digits)
        .ok_or_else(|| P1Error::InvalidValue(format!("'{digits}' is not a number")))?;
    trace!("{} = {value} ({unit})", entry.obis);

    uint_le_bytes(value, entry.width).ok_or(P1Error::ValueOverflow {
        obis: entry.obis,
        value,
        width: entry.width,
    })
}

/// Object identifier in front of the first group.
fn obis_code(input: &str) -> IResult<&str, &str> {
    let (input, obis) = take_until("(")(input)?;
    Ok((input, obis.trim()))
}

/// One or more parenthesized value groups.
fn cosem_groups(input: &str) -> IResult<&str, Vec<&str>> {
    many1(delimited(char('('), take_until(")"), char(')')))(input)
}

/// Splits a data line into its object identifier and parenthesized groups.
#[cfg(test)]
fn cosem_line(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    let (input, obis) = obis_code(input)?;
    let (input, groups) = cosem_groups(input)?;
    Ok((input, (obis, groups)))
}

/// Splits `value*unit`.
fn measurement(group: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_until("*"), char('*'), rest)(group)
}

/// Parses a decimal number with its decimal point removed.
fn fixed_point(digits: &str) -> Option<u64> {
    let stripped: String = digits.chars().filter(|&c| c != '.').collect();
    if stripped.is_empty() || !stripped.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stripped.parse().ok()
}

/// Parses `YYMMDDhhmmssX`, where X is the daylight saving flag.
fn parse_timestamp(group: &str) -> Option<NaiveDateTime> {
    let stamp = group.get(..12)?;
    NaiveDateTime::parse_from_str(stamp, "%y%m%d%H%M%S").ok()
}
