//! Logger initialization for native and browser builds.

use crate::config::LogLevel;

/// Install the global logger. Safe to call more than once; later calls are
/// ignored by the underlying logger.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level.to_level_filter())
        // Decoder crates are noisy at debug level
        .filter_module("png", log::LevelFilter::Warn)
        .filter_module("usvg", log::LevelFilter::Warn)
        .filter_module("resvg", log::LevelFilter::Warn)
        .parse_default_env()
        .format_timestamp_millis();

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Install the console logger and panic hook.
#[cfg(target_arch = "wasm32")]
pub fn init(level: LogLevel) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level.to_level()).is_err() {
        log::debug!("Logger already initialized");
    }
}
