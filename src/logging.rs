use log::{info, log_enabled, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// The level comes from `RUST_LOG` and defaults to `info`.
pub fn init_logger() {
    init_logger_with_level("info");
}

/// Initializes the logger, using `default_level` when `RUST_LOG` is not set.
///
/// Calling it again is harmless; only the first call installs the logger.
pub fn init_logger_with_level(default_level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}
