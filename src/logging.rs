// src/logging.rs

//! Logging setup for `quasar` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `QUASAR_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that child processes sharing our terminal keep
//! stdout for themselves.
//!
//! The dispatcher reports five severities. They map onto tracing like this:
//!
//! | severity | macro    | extra field           |
//! |----------|----------|-----------------------|
//! | debug    | `debug!` |                       |
//! | info     | `info!`  |                       |
//! | success  | `info!`  | `outcome = "success"` |
//! | error    | `error!` |                       |
//! | critical | `error!` | `critical = true`     |
//!
//! [`success!`] and [`critical!`] attach the extra field.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// `info!` tagged `outcome = "success"`.
#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        $crate::logging::__private::tracing::info!(outcome = "success", $($arg)+)
    };
}

/// `error!` tagged `critical = true`.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        $crate::logging::__private::tracing::error!(critical = true, $($arg)+)
    };
}

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV: &str = "QUASAR_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var(LOG_ENV)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
