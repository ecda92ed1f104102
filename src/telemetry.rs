//! Telemetry Module - Structured Logging with Tracing
//!
//! - Console output on stderr (stdout stays clean)
//! - JSON vs pretty format support
//! - Optional file logging with rotation
//! - RUST_LOG env var support, default `warn` so a good run prints nothing
//! - Sampling and truncation helpers

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub log_level: String,
    /// Log format: "json" or "pretty"
    pub log_format: String,
    /// Optional log file path (None = stderr only)
    pub log_file: Option<String>,
    /// Rotation interval: "daily", "hourly", "never"
    pub rotation: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl TelemetryConfig {
    /// Build from `RUST_LOG` and `DUMP2BIN_LOG_*` values supplied by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "warn".to_string()),
            log_format: lookup("DUMP2BIN_LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            log_file: lookup("DUMP2BIN_LOG_FILE"),
            rotation: lookup("DUMP2BIN_LOG_ROTATION").unwrap_or_else(|| "never".to_string()),
        }
    }
}

/// Initialize tracing subscriber
///
/// Returns the file writer guard when logging to a file; hold it until exit
/// so buffered lines get flushed.
pub fn init_tracing(
    config: TelemetryConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if let Some(log_file_path) = config.log_file {
        let path = std::path::Path::new(&log_file_path);
        let directory = path
            .parent()
            .ok_or("Invalid log file path: no parent directory")?;
        let file_name = path
            .file_name()
            .ok_or("Invalid log file path: no filename")?;
        let filename_prefix = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or("Invalid log file path: no filename")?;

        let file_appender = match config.rotation.as_str() {
            "daily" => rolling::daily(directory, filename_prefix),
            "hourly" => rolling::hourly(directory, filename_prefix),
            _ => rolling::never(directory, file_name),
        };

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if config.log_format == "json" {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_writer(non_blocking),
                )
                .try_init()?;
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_writer(non_blocking),
                )
                .try_init()?;
        }

        Ok(Some(guard))
    } else {
        if config.log_format == "json" {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }

        Ok(None)
    }
}

/// Truncate hex string for logging
///
/// Example: "0a1b2c3d4e5f67890a1b2c3d4e5f6789" → "0a1b2c3d4e5f6789..."
pub fn truncate_hex(hex: &str, len: usize) -> String {
    match hex.get(..len) {
        Some(head) if hex.len() > len => format!("{}...", head),
        _ => hex.to_string(),
    }
}

/// Returns true every `interval` calls, starting with the first
pub fn should_log_progress(counter: &AtomicU64, interval: u64) -> bool {
    let count = counter.fetch_add(1, Ordering::Relaxed);
    count % interval == 0
}

/// Sampled row counter for progress events
///
/// ```
/// use dump2bin::telemetry::ProgressCounter;
///
/// let progress = ProgressCounter::new(1_000_000);
/// assert!(progress.should_log());
/// assert_eq!(progress.get(), 1);
/// ```
pub struct ProgressCounter {
    counter: AtomicU64,
    interval: u64,
}

impl ProgressCounter {
    pub fn new(interval: u64) -> Self {
        Self {
            counter: AtomicU64::new(0),
            interval: interval.max(1),
        }
    }

    pub fn should_log(&self) -> bool {
        should_log_progress(&self.counter, self.interval)
    }

    pub fn get(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_without_env() {
        let config = TelemetryConfig::from_lookup(|_| None);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, "pretty");
        assert!(config.log_file.is_none());
        assert_eq!(config.rotation, "never");
    }

    #[test]
    fn test_config_reads_rotation() {
        let config = TelemetryConfig::from_lookup(|key| match key {
            "DUMP2BIN_LOG_FILE" => Some("/var/log/dump2bin.log".to_string()),
            "DUMP2BIN_LOG_ROTATION" => Some("daily".to_string()),
            "DUMP2BIN_LOG_FORMAT" => Some("json".to_string()),
            _ => None,
        });
        assert_eq!(config.rotation, "daily");
        assert_eq!(config.log_format, "json");
        assert_eq!(config.log_file.as_deref(), Some("/var/log/dump2bin.log"));
    }

    #[test]
    fn test_truncate_hex() {
        assert_eq!(truncate_hex("abcd", 16), "abcd");
        assert_eq!(truncate_hex("0123456789abcdef0123456789abcdef", 16), "0123456789abcdef...");
        assert_eq!(truncate_hex("", 16), "");
    }

    #[test]
    fn test_truncate_non_ascii() {
        // Cutting inside a multibyte char must not panic
        assert_eq!(truncate_hex("ééé", 1), "ééé");
    }

    #[test]
    fn test_should_log_progress() {
        let counter = AtomicU64::new(0);

        // count=0: 0 % 10 == 0
        assert!(should_log_progress(&counter, 10));

        for _ in 1..10 {
            assert!(!should_log_progress(&counter, 10));
        }

        // count=10
        assert!(should_log_progress(&counter, 10));
    }

    #[test]
    fn test_progress_counter() {
        let counter = ProgressCounter::new(5);

        assert!(counter.should_log());  // 0 % 5 == 0
        assert!(!counter.should_log()); // 1
        assert!(!counter.should_log()); // 2
        assert!(!counter.should_log()); // 3
        assert!(!counter.should_log()); // 4
        assert!(counter.should_log());  // 5 % 5 == 0

        assert_eq!(counter.get(), 6);
    }

    #[test]
    fn test_zero_interval_does_not_divide_by_zero() {
        let counter = ProgressCounter::new(0);
        assert!(counter.should_log());
        assert!(counter.should_log());
    }
}
