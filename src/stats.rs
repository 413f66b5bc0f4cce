//! Counters describing what the bridge has done since startup.

use crate::error::P1Error;
use crate::zigbee::report::ReportSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStats {
    /// Acquisition cycles started
    pub cycles: u64,
    pub telegrams_parsed: u64,
    pub acquisition_timeouts: u64,
    /// Checksum mismatches and telegrams without a usable checksum field
    pub checksum_failures: u64,
    pub serial_errors: u64,
    /// Recognized lines whose value was unusable
    pub skipped_lines: u64,
    pub frames_sent: u64,
    pub transmit_failures: u64,
    pub requests_answered: u64,
    pub requests_dropped: u64,
}

impl BridgeStats {
    /// Counts a failed acquisition or validation.
    pub fn record_error(&mut self, error: &P1Error) {
        match error {
            P1Error::AcquisitionTimeout { .. } => self.acquisition_timeouts += 1,
            P1Error::ChecksumMismatch { .. } | P1Error::InvalidTelegram(_) => {
                self.checksum_failures += 1
            }
            P1Error::SerialPortError(_) => self.serial_errors += 1,
            P1Error::TransmitFailure(_) => self.transmit_failures += 1,
            P1Error::MalformedRequest(_) => self.requests_dropped += 1,
            _ => {}
        }
    }

    pub fn record_reports(&mut self, summary: ReportSummary) {
        self.frames_sent += summary.sent as u64;
        self.transmit_failures += summary.failed as u64;
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AcquisitionStage;

    #[test]
    fn test_record_error() {
        let mut stats = BridgeStats::default();
        stats.record_error(&P1Error::AcquisitionTimeout {
            stage: AcquisitionStage::Body,
        });
        stats.record_error(&P1Error::ChecksumMismatch {
            expected: 1,
            calculated: 2,
        });
        stats.record_error(&P1Error::InvalidTelegram("short".into()));
        stats.record_error(&P1Error::MalformedRequest("short".into()));
        assert_eq!(stats.acquisition_timeouts, 1);
        assert_eq!(stats.checksum_failures, 2);
        assert_eq!(stats.requests_dropped, 1);
    }

    #[test]
    fn test_json() {
        let mut stats = BridgeStats::default();
        stats.record_reports(ReportSummary { sent: 3, failed: 1 });
        let parsed: BridgeStats = serde_json::from_str(&stats.to_json()).unwrap();
        assert_eq!(parsed.frames_sent, 3);
        assert_eq!(parsed.transmit_failures, 1);
    }
}
