//! Lightweight diagnostics for waflog
//!
//! Structured logging to stderr, shared by every crate in the workspace.
//! Console progress (downloads, matches, the report table) is separate and
//! goes to stdout through the pipeline's output callback.
//!
//! Usage:
//! - Set WAFLOG_LOG=off (default) - no logs
//! - Set WAFLOG_LOG=info - listing pages, downloads, per-file match counts
//! - Set WAFLOG_LOG=debug - keys, byte counts, decompression details

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`]
pub const LOG_ENV: &str = "WAFLOG_LOG";

static INIT: Once = Once::new();

/// Minimum level for a `WAFLOG_LOG` value, `None` meaning logging is off.
///
/// Unknown values fall back to `Info`; the bool reports whether the value
/// was recognized.
#[must_use]
pub fn parse_level(value: &str) -> (Option<emit::Level>, bool) {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => (None, true),
        "debug" => (Some(emit::Level::Debug), true),
        "info" => (Some(emit::Level::Info), true),
        "warn" => (Some(emit::Level::Warn), true),
        "error" => (Some(emit::Level::Error), true),
        _ => (Some(emit::Level::Info), false),
    }
}

/// Initialize diagnostics based on the WAFLOG_LOG environment variable
///
/// Call once at application startup. Subsequent calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let log_level = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());

        let (level, known) = parse_level(&log_level);
        let Some(level) = level else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if !known {
            emit::warn!("Unknown {env} value {log_level}, using info", env: LOG_ENV);
        }

        // The runtime must outlive every emitter call for the process lifetime.
        std::mem::forget(rt);
    });
}

/// Log basic operations (listing pages, downloads, match totals)
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (keys, byte counts, internal steps)
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems, such as an object that failed to process
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that end the run
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

// Short-name versions

/// Short form of [`log_info!`]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Short form of [`log_debug!`]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Short form of [`log_warn!`]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Short form of [`log_error!`]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
