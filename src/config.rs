//! # Bridge Configuration
//!
//! All settings of the bridge, loadable from a JSON file. Every field has a
//! default, so a file only needs to name what it changes:
//!
//! ```json
//! { "serial": { "port": "/dev/ttyAMA0" }, "always_publish": false }
//! ```

use crate::constants::ENDPOINT_ELECTRICITY;
use crate::error::P1Error;
use crate::p1::reader::ReaderConfig;
use crate::p1::serial::SerialConfig;
use crate::zigbee::meter::DeviceInfo;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub serial: SerialConfig,
    /// Seconds between acquisition cycles
    pub cycle_time_secs: u64,
    /// Report every value each cycle instead of only changes
    pub always_publish: bool,
    pub reader: ReaderConfig,
    /// Coordinator endpoint that receives attribute reports
    pub report_destination_endpoint: u8,
    pub device: DeviceInfo,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            serial: SerialConfig::default(),
            cycle_time_secs: 15,
            always_publish: true,
            reader: ReaderConfig::default(),
            report_destination_endpoint: ENDPOINT_ELECTRICITY,
            device: DeviceInfo::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, P1Error> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| P1Error::ConfigError(format!("{}: {e}", path.display())))?;
        let config: BridgeConfig = serde_json::from_str(&json)
            .map_err(|e| P1Error::ConfigError(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), P1Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| P1Error::ConfigError(e.to_string()))?;
        fs::write(path.as_ref(), json)
            .map_err(|e| P1Error::ConfigError(format!("{}: {e}", path.as_ref().display())))
    }

    /// Rejects settings the bridge cannot run with.
    pub fn validate(&self) -> Result<(), P1Error> {
        if self.cycle_time_secs == 0 {
            return Err(P1Error::ConfigError("cycle_time_secs must be positive".into()));
        }
        if self.serial.baudrate == 0 {
            return Err(P1Error::ConfigError("baudrate must be positive".into()));
        }
        let reader = &self.reader;
        if reader.scan_polls == 0 || reader.body_polls == 0 || reader.tail_polls == 0 {
            return Err(P1Error::ConfigError("poll budgets must be positive".into()));
        }
        for (name, value) in [
            ("manufacturer", &self.device.manufacturer),
            ("model", &self.device.model),
            ("date_code", &self.device.date_code),
            ("sw_build", &self.device.sw_build),
        ] {
            if value.len() > u8::MAX as usize {
                return Err(P1Error::ConfigError(format!("{name} longer than 255 bytes")));
            }
        }
        Ok(())
    }

    pub fn cycle_time(&self) -> Duration {
        Duration::from_secs(self.cycle_time_secs)
    }
}
