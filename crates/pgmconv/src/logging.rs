//! Subscriber setup for the crate's `tracing` events.
//!
//! The library only emits events: conversion boundaries at `info`, parsed
//! blocks and attached tree nodes at `debug`, skipped tokens and normalization
//! mismatches at `warn`. Binaries that want to see them install a subscriber:
//!
//! ```no_run
//! use pgmconv::logging::{LogFormat, LogLevel, Logger};
//!
//! Logger::builder()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Debug)
//!     .install()
//!     .expect("logger already installed");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{PgmError, Result};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored
    Pretty,
    /// One line per event, no colors
    Compact,
    /// One JSON object per event
    Json,
}

/// Minimum level shown when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerBuilder {
    format: LogFormat,
    level: LogLevel,
    env_filter: Option<String>,
    with_targets: bool,
    with_file_location: bool,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: LogLevel::Warn,
            env_filter: None,
            with_targets: true,
            with_file_location: false,
        }
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Filter directives such as `pgmconv::clique_tree=debug`; overrides the level.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub fn with_targets(mut self, enabled: bool) -> Self {
        self.with_targets = enabled;
        self
    }

    pub fn with_file_location(mut self, enabled: bool) -> Self {
        self.with_file_location = enabled;
        self
    }

    fn filter(&self) -> Result<EnvFilter> {
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives)
                .map_err(|e| PgmError::Config(format!("invalid log filter: {}", e))),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))),
        }
    }

    /// Install the global subscriber.
    ///
    /// Only one subscriber can be installed per process; later calls fail.
    pub fn install(self) -> Result<Logger> {
        let filter = self.filter()?;
        let layer = fmt::layer()
            .with_target(self.with_targets)
            .with_file(self.with_file_location)
            .with_line_number(self.with_file_location)
            .with_writer(std::io::stderr);
        let registry = tracing_subscriber::registry().with(filter);

        let installed = match self.format {
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
            LogFormat::Compact => registry.with(layer.with_ansi(false).compact()).try_init(),
            LogFormat::Json => registry.with(layer.json()).try_init(),
        };
        installed.map_err(|e| PgmError::Config(format!("failed to install logger: {}", e)))?;
        Ok(Logger {
            format: self.format,
        })
    }
}

/// Handle for an installed subscriber.
#[derive(Debug)]
pub struct Logger {
    format: LogFormat,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Install with defaults: compact, warnings and errors.
    pub fn init() -> Result<Self> {
        Self::builder().install()
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }
}
