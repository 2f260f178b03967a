//! Logging configuration and initialization
//!
//! Centralized structured logging for the pipeline and the monitor. Console
//! output is human-readable by default; file output always goes to a single
//! fixed file (no rotation) in JSON format, one object per line with
//! timestamp, level, message, and any structured fields. The monitor's
//! `/metrics` endpoint reports the size of that file, so its name must be
//! stable across runs.
//!
//! Prefer the `tracing` macros with fields over bare string formatting:
//!
//! ```rust
//! use tracing::{info, warn};
//!
//! info!(count = 20, "Fetched users from API");
//! warn!(record = %"abc123", "Skipping malformed record");
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Output target for logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Console only
    Console,
    /// Log file only
    File,
    /// Both console and log file
    #[default]
    Both,
}

impl std::str::FromStr for LogOutput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(anyhow::anyhow!("Invalid log output: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum log level to emit
    pub level: LogLevel,

    /// Output target (console, file, or both)
    pub output: LogOutput,

    /// Directory holding the log file
    pub log_dir: PathBuf,

    /// Fixed log file name within `log_dir` (not rotated)
    pub log_file_name: String,

    /// Additional filter directives (e.g. "sqlx=warn,hyper=info")
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            output: LogOutput::Both,
            log_dir: PathBuf::from("./logs"),
            log_file_name: "etl.log".to_string(),
            filter_directives: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full path of the log file
    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }

    /// Load configuration from environment variables
    ///
    /// - `LOG_LEVEL`: trace, debug, info, warn, error
    /// - `LOG_OUTPUT`: console, file, both
    /// - `LOG_DIR`: directory for the log file
    /// - `LOG_FILE_NAME`: log file name within the directory
    /// - `LOG_FILTER`: additional filter directives
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Apply environment overrides on top of this configuration
    ///
    /// Fields with no corresponding environment variable keep their current
    /// value, so programmatic settings (e.g. a `--verbose` flag) survive
    /// unless the environment explicitly overrides them.
    pub fn merge_env(mut self) -> Result<Self> {
        let config = &mut self;

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.level = level.parse()?;
        }

        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            config.output = output.parse()?;
        }

        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Ok(name) = std::env::var("LOG_FILE_NAME") {
            config.log_file_name = name;
        }

        if let Ok(filter) = std::env::var("LOG_FILTER") {
            config.filter_directives = Some(filter);
        }

        Ok(self)
    }
}

/// Initialize the global tracing subscriber
///
/// Must be called once at process startup, before any logging happens.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut filter =
        EnvFilter::from_default_env().add_directive(config.level.to_tracing_level().into());

    if let Some(ref directives) = config.filter_directives {
        for directive in directives.split(',') {
            filter = filter.add_directive(
                directive
                    .parse()
                    .context("Failed to parse filter directive")?,
            );
        }
    }

    match config.output {
        LogOutput::Console => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer())
                .try_init()?;
        },
        LogOutput::File => {
            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer(config)?)
                .try_init()?;
        },
        LogOutput::Both => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer())
                .with(file_layer(config)?)
                .try_init()?;
        },
    }

    Ok(())
}

fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer().with_writer(std::io::stdout).with_target(true)
}

/// JSON layer writing to the fixed log file, one object per line
fn file_layer<S>(config: &LogConfig) -> Result<impl tracing_subscriber::Layer<S>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

    let file_appender =
        tracing_appender::rolling::never(&config.log_dir, &config.log_file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes buffered log lines on drop; leak it so it lives for
    // the whole process.
    std::mem::forget(guard);

    Ok(fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_ansi(false))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("invalid".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_output_from_str() {
        assert_eq!("console".parse::<LogOutput>().unwrap(), LogOutput::Console);
        assert_eq!("file".parse::<LogOutput>().unwrap(), LogOutput::File);
        assert_eq!("all".parse::<LogOutput>().unwrap(), LogOutput::Both);
        assert!("invalid".parse::<LogOutput>().is_err());
    }

    #[test]
    fn test_log_file_path() {
        let config = LogConfig {
            log_dir: PathBuf::from("/var/log/ruetl"),
            log_file_name: "etl.log".to_string(),
            ..LogConfig::default()
        };
        assert_eq!(config.log_file_path(), PathBuf::from("/var/log/ruetl/etl.log"));
    }

    #[test]
    fn test_merge_env_keeps_programmatic_settings() {
        std::env::remove_var("LOG_LEVEL");
        std::env::remove_var("LOG_OUTPUT");

        let base = LogConfig {
            level: LogLevel::Debug,
            output: LogOutput::Console,
            ..LogConfig::default()
        };

        // With no environment overrides, the base settings survive.
        let merged = base.clone().merge_env().unwrap();
        assert_eq!(merged.level, LogLevel::Debug);
        assert_eq!(merged.output, LogOutput::Console);

        // An explicit variable overrides only its own field.
        std::env::set_var("LOG_LEVEL", "error");
        let merged = base.merge_env().unwrap();
        assert_eq!(merged.level, LogLevel::Error);
        assert_eq!(merged.output, LogOutput::Console);
        std::env::remove_var("LOG_LEVEL");
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::new();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.output, LogOutput::Both);
        assert_eq!(config.log_file_name, "etl.log");
    }
}
