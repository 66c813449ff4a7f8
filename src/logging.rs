//! Structured logging setup
//!
//! Decoding itself only emits `tracing` events; installing a subscriber is
//! left to the host. The CLI installs one through [`init_logging_with_config`].
//!
//! Parameter values can carry credentials (API keys in headers, session
//! cookies), so rejected raw values pass through [`redact_value`] before they
//! reach a log line.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// How much of a parameter value may appear in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactionLevel {
    /// Log raw values as received (dev only)
    None,
    /// Mask values of credential-like parameters
    Credentials,
    /// Mask every value
    Full,
}

impl RedactionLevel {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => RedactionLevel::None,
            "full" => RedactionLevel::Full,
            _ => RedactionLevel::Credentials,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    pub redact_level: RedactionLevel,
    /// Extra `EnvFilter` directives, comma-separated
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("BRRTR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("BRRTR_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            redact_level: RedactionLevel::parse(
                &env::var("BRRTR_LOG_REDACT_LEVEL").unwrap_or_else(|_| "credentials".to_string()),
            ),
            target_filter: env::var("BRRTR_LOG_TARGET_FILTER").ok(),
            include_location: env::var("BRRTR_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }
}

static REDACTION: OnceCell<RedactionLevel> = OnceCell::new();

/// Redaction level in effect: whatever logging was initialized with, else
/// `credentials`.
pub fn redaction_level() -> RedactionLevel {
    *REDACTION.get().unwrap_or(&RedactionLevel::Credentials)
}

/// Whether a parameter with this name carries a secret.
pub fn is_sensitive(name: &str) -> bool {
    const CREDENTIAL_PATTERNS: [&str; 10] = [
        "password",
        "passwd",
        "pwd",
        "secret",
        "key",
        "token",
        "authorization",
        "credential",
        "session",
        "cookie",
    ];
    let name = name.to_lowercase();
    CREDENTIAL_PATTERNS.iter().any(|p| name.contains(p))
}

/// A loggable rendering of `value`, the raw value of parameter `name`.
pub fn redact_value(level: RedactionLevel, name: &str, value: &str) -> String {
    match level {
        RedactionLevel::None => value.to_string(),
        RedactionLevel::Credentials if !is_sensitive(name) => value.to_string(),
        _ => {
            let lowered = name.to_lowercase();
            let keeps_prefix = lowered.contains("key") || lowered.contains("token");
            match value.get(..4) {
                Some(prefix) if keeps_prefix && value.len() > 8 => format!("{prefix}***"),
                _ => "<REDACTED>".to_string(),
            }
        }
    }
}

/// Install the global subscriber.
///
/// Output goes to stderr so that stdout stays free for command results.
///
/// ```no_run
/// use brrtparam::logging::{init_logging_with_config, LogConfig};
///
/// init_logging_with_config(&LogConfig::from_env())
///     .expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    REDACTION.get_or_init(|| config.redact_level);
    Ok(())
}
