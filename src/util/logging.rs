//! # Logging Utilities
//!
//! Rate limiting for warnings that repeat every acquisition cycle (a meter
//! that is unplugged times out every 15 seconds forever) and hex logging of
//! frames.
//!
//! ```rust
//! use p1_zigbee_rs::util::logging::{log_frame_hex, LogThrottle};
//!
//! let mut throttle = LogThrottle::new(60_000, 3); // 3 messages per minute
//! if throttle.allow() {
//!     log::warn!("Telegram checksum mismatch");
//! }
//! log_frame_hex("TX", &[0x00, 0x01, 0x0A]);
//! ```

use std::collections::HashMap;
use std::time::Instant;

/// Throttling structure for rate-limiting log messages
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Messages refused since the last allowed one
    suppressed: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = now;
            self.count = 0;
        }

        self.count += 1;
        if self.count <= self.cap {
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Number of refused messages since the last call, resetting the counter.
    pub fn take_suppressed(&mut self) -> u32 {
        std::mem::take(&mut self.suppressed)
    }
}

/// Independent throttles per message category ("acquisition", "checksum", ...).
#[derive(Debug)]
pub struct ThrottleManager {
    window_ms: u64,
    cap: u32,
    throttles: HashMap<&'static str, LogThrottle>,
}

impl ThrottleManager {
    /// Create a manager whose categories share the same window and cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            throttles: HashMap::new(),
        }
    }

    /// Check if logging is allowed for a specific category
    pub fn allow(&mut self, category: &'static str) -> bool {
        let (window_ms, cap) = (self.window_ms, self.cap);
        self.throttles
            .entry(category)
            .or_insert_with(|| LogThrottle::new(window_ms, cap))
            .allow()
    }

    /// Warnings of `category` refused since the last allowed one, resetting the count.
    pub fn take_suppressed(&mut self, category: &'static str) -> u32 {
        self.throttles
            .get_mut(category)
            .map_or(0, LogThrottle::take_suppressed)
    }
}

impl Default for ThrottleManager {
    fn default() -> Self {
        // 3 messages per 5 minutes, i.e. the first few cycles of an outage
        Self::new(300_000, 3)
    }
}

/// Log frame data in hex format for debugging
///
/// Output is capped at 64 bytes.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    let display_data = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(display_data);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!("{prefix}: {hex_str}{suffix}");
}

/// Log a warning with throttling
///
/// When a category's window reopens, the number of warnings swallowed in the
/// meantime is logged first.
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $category:expr, $($arg:tt)*) => {
        if $throttle.allow($category) {
            let suppressed = $throttle.take_suppressed($category);
            if suppressed > 0 {
                log::warn!("{} similar {} warnings suppressed", suppressed, $category);
            }
            log::warn!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_throttle_basic() {
        let mut throttle = LogThrottle::new(1000, 3);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(throttle.allow());

        assert!(!throttle.allow());
        assert!(!throttle.allow());
        assert_eq!(throttle.take_suppressed(), 2);
        assert_eq!(throttle.take_suppressed(), 0);
    }

    #[test]
    fn test_throttle_manager() {
        let mut manager = ThrottleManager::new(1000, 2);

        assert!(manager.allow("checksum"));
        assert!(manager.allow("acquisition"));
        assert!(manager.allow("checksum"));
        assert!(!manager.allow("checksum"));
        assert!(manager.allow("acquisition"));
        assert_eq!(manager.take_suppressed("checksum"), 1);
        assert_eq!(manager.take_suppressed("acquisition"), 0);
        assert_eq!(manager.take_suppressed("unknown"), 0);
    }

    #[test]
    fn test_suppressed_count_drained_when_window_reopens() {
        let mut manager = ThrottleManager::new(1, 1);

        crate::log_warn_throttled!(manager, "checksum", "first");
        crate::log_warn_throttled!(manager, "checksum", "second");
        crate::log_warn_throttled!(manager, "checksum", "third");

        std::thread::sleep(std::time::Duration::from_millis(5));
        crate::log_warn_throttled!(manager, "checksum", "after window");
        assert_eq!(manager.take_suppressed("checksum"), 0);

        crate::log_warn_throttled!(manager, "checksum", "refused again");
        assert_eq!(manager.take_suppressed("checksum"), 1);
    }
}
