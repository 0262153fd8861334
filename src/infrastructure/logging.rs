//! Centralized file-based logging system
//!
//! Writes logs to files under a logs directory, separated by log type:
//! - main - all logs, JSON
//! - error - warnings and errors only
//! - relay - relay core and snapshot storage
//! - api - HTTP server

use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Subdirectories created under the logs directory
pub const LOG_TYPES: [&str; 4] = ["main", "error", "relay", "api"];

/// Initialize console and file logging
///
/// Returns the appender guards, which must be kept alive for the duration
/// of the program. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(logs_dir: impl AsRef<Path>) -> std::io::Result<Vec<WorkerGuard>> {
    let logs_dir = logs_dir.as_ref();
    create_log_dirs(logs_dir)?;

    let mut guards = Vec::new();

    let (main_appender, main_guard) = create_appender(&logs_dir.join("main"), "main");
    guards.push(main_guard);

    let (error_appender, error_guard) = create_appender(&logs_dir.join("error"), "error");
    guards.push(error_guard);

    let (relay_appender, relay_guard) = create_appender(&logs_dir.join("relay"), "relay");
    guards.push(relay_guard);

    let (api_appender, api_guard) = create_appender(&logs_dir.join("api"), "api");
    guards.push(api_guard);

    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .json();

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let relay_layer = tracing_subscriber::fmt::layer()
        .with_writer(relay_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            is_relay_target(metadata.target())
        }));

    let api_layer = tracing_subscriber::fmt::layer()
        .with_writer(api_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            is_api_target(metadata.target())
        }));

    // Console layer for development
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(main_layer)
        .with(error_layer)
        .with(relay_layer)
        .with(api_layer)
        .with(console_layer)
        .init();

    tracing::info!("Logging system initialized. Log files in {}", logs_dir.display());

    Ok(guards)
}

fn create_log_dirs(logs_dir: &Path) -> std::io::Result<()> {
    for log_type in LOG_TYPES {
        fs::create_dir_all(logs_dir.join(log_type))?;
    }
    Ok(())
}

/// Create a rolling file appender
fn create_appender(dir: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, name);
    tracing_appender::non_blocking(appender)
}

fn is_relay_target(target: &str) -> bool {
    target == "relay" || target == "storage" || target.starts_with("chat_relay::relay")
}

fn is_api_target(target: &str) -> bool {
    target == "api" || target.starts_with("chat_relay::infrastructure::api")
}

/// Log macro helpers for specific log types
#[macro_export]
macro_rules! log_relay {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "relay", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_api {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "api", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_main {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "main", $level, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_creation() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        create_log_dirs(&logs).unwrap();
        for log_type in LOG_TYPES {
            assert!(logs.join(log_type).is_dir());
        }
        // idempotent
        create_log_dirs(&logs).unwrap();
    }

    #[test]
    fn test_target_routing() {
        assert!(is_relay_target("relay"));
        assert!(is_relay_target("storage"));
        assert!(is_relay_target("chat_relay::relay::scheduler"));
        assert!(!is_relay_target("chat_relay"));
        assert!(!is_relay_target("chat_relay::infrastructure::config"));
        assert!(is_api_target("api"));
        assert!(!is_api_target("relay"));
        assert!(!is_api_target("chat_relay::relay::state"));
    }
}
