//! Logging setup and secret redaction
//!
//! Structured logging via `tracing`:
//! - JSON output by default, human-readable with `LOG_FORMAT=pretty`
//! - level filter from `RUST_LOG`
//! - everything goes to stderr, so the signer binaries can keep stdout for their JSON output
//!
//! Private keys never reach a log line: anything that might hold one is
//! wrapped in `SanitizedValue`. Signed requests log only a prefix of each
//! signature through `sanitize_signature`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | `loopring_signer=info` | Log level filter (standard tracing format) |
//! | `LOG_FORMAT` | `json` | Output format: `json` or `pretty` |
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use loopring_signer::config::logging::{init_logging, SanitizedValue};
//!
//! init_logging();
//! let key = std::env::var("L2_PRIVATE_KEY").unwrap_or_default();
//! tracing::info!(l2_key = %SanitizedValue::new(&key), "Loaded key");
//! ```

use std::env;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt as ts_fmt, fmt::format::FmtSpan, prelude::*, EnvFilter};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Default log level when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "loopring_signer=info";

/// Redacting wrapper for secrets.
///
/// Values longer than 8 characters show their first 4; shorter ones are
/// fully redacted. `Debug` never shows anything.
#[derive(Clone)]
pub struct SanitizedValue<'a>(&'a str);

impl<'a> SanitizedValue<'a> {
    pub fn new(value: &'a str) -> Self {
        Self(value)
    }

    /// The raw value. For processing only, never for logging.
    pub fn expose(&self) -> &str {
        self.0
    }
}

impl fmt::Display for SanitizedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get(..4) {
            Some(prefix) if self.0.len() > 8 => write!(f, "{}...REDACTED", prefix),
            _ => write!(f, "REDACTED"),
        }
    }
}

impl fmt::Debug for SanitizedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SanitizedValue(***)")
    }
}

/// First 8 characters of a signature, or `REDACTED` if it is too short to shorten.
pub fn sanitize_signature(sig: &str) -> String {
    match sig.get(..8) {
        Some(prefix) if sig.len() > 12 => format!("{}...", prefix),
        _ => "REDACTED".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter string (e.g., "loopring_signer=debug")
    pub level_filter: String,
    /// Use pretty format instead of JSON
    pub use_pretty_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level_filter: DEFAULT_LOG_LEVEL.to_string(),
            use_pretty_format: false,
        }
    }
}

impl LoggingConfig {
    /// Reads `RUST_LOG` and `LOG_FORMAT`.
    pub fn from_env() -> Self {
        let level_filter = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        let use_pretty_format = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("pretty"))
            .unwrap_or(false);

        Self {
            level_filter,
            use_pretty_format,
        }
    }
}

/// Initializes logging from the environment. Later calls are no-ops.
pub fn init_logging() {
    init_logging_with_config(LoggingConfig::from_env());
}

pub fn init_logging_with_config(config: LoggingConfig) {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    let env_filter =
        EnvFilter::try_new(&config.level_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if config.use_pretty_format {
        tracing_subscriber::registry()
            .with(
                ts_fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                ts_fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_current_span(true),
            )
            .with(env_filter)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_sanitized_value_long_key() {
        let key = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        assert_eq!(format!("{}", SanitizedValue::new(key)), "0x4c...REDACTED");
    }

    #[test]
    fn test_sanitized_value_short_and_empty() {
        assert_eq!(format!("{}", SanitizedValue::new("0x5")), "REDACTED");
        assert_eq!(format!("{}", SanitizedValue::new("")), "REDACTED");
        // exactly 8 is not > 8
        assert_eq!(format!("{}", SanitizedValue::new("12345678")), "REDACTED");
        assert_eq!(format!("{}", SanitizedValue::new("123456789")), "1234...REDACTED");
    }

    #[test]
    fn test_sanitized_value_multibyte_does_not_panic() {
        assert_eq!(format!("{}", SanitizedValue::new("abcéééééé")), "REDACTED");
    }

    #[test]
    fn test_sanitized_value_debug() {
        assert_eq!(format!("{:?}", SanitizedValue::new("0x1234567890")), "SanitizedValue(***)");
        assert_eq!(SanitizedValue::new("0x1234567890").expose(), "0x1234567890");
    }

    #[test]
    fn test_sanitize_signature() {
        assert_eq!(sanitize_signature("0x1234567890abcdef1234567890abcdef"), "0x123456...");
        assert_eq!(sanitize_signature("short"), "REDACTED");
        assert_eq!(sanitize_signature(""), "REDACTED");
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level_filter, DEFAULT_LOG_LEVEL);
        assert!(!config.use_pretty_format);
    }

    #[test]
    #[serial(env)]
    fn test_logging_config_from_env() {
        std::env::set_var("LOG_FORMAT", "Pretty");
        std::env::set_var("RUST_LOG", "loopring_signer=debug");
        let config = LoggingConfig::from_env();
        assert!(config.use_pretty_format);
        assert_eq!(config.level_filter, "loopring_signer=debug");
        std::env::remove_var("LOG_FORMAT");
        std::env::remove_var("RUST_LOG");
    }
}
