//! Configuration file tests.

use p1_zigbee_rs::{BridgeConfig, P1Error};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_partial_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"serial": {{"port": "/dev/ttyAMA0"}}, "cycle_time_secs": 10, "device": {{"model": "P1 Dongle"}}}}"#
    )
    .unwrap();

    let config = BridgeConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.serial.port, "/dev/ttyAMA0");
    assert_eq!(config.serial.baudrate, 115_200);
    assert_eq!(config.cycle_time_secs, 10);
    assert_eq!(config.device.model, "P1 Dongle");
    assert_eq!(config.device.manufacturer, "consp");
    assert!(config.always_publish);
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.json");

    let mut config = BridgeConfig::default();
    config.always_publish = false;
    config.reader.scan_polls = 25;
    config.report_destination_endpoint = 3;
    config.save_to_file(&path).unwrap();

    assert_eq!(BridgeConfig::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_invalid_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(matches!(
        BridgeConfig::load_from_file(file.path()),
        Err(P1Error::ConfigError(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = BridgeConfig::load_from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(P1Error::ConfigError(_))));
}

#[test]
fn test_inconsistent_values_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"reader": {{"body_polls": 0}}}}"#).unwrap();
    assert!(matches!(
        BridgeConfig::load_from_file(file.path()),
        Err(P1Error::ConfigError(_))
    ));

    let config = BridgeConfig {
        device: p1_zigbee_rs::DeviceInfo {
            manufacturer: "x".repeat(256),
            ..Default::default()
        },
        ..BridgeConfig::default()
    };
    assert!(config.validate().is_err());
}
