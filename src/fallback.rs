//! The last-resort local record of every log call, written whether or not
//! the viewer is reachable.
use crate::error::ConfigError;
use crate::record::{LogLevel, LogRecord};
use colored::Colorize;
use std::str::FromStr;

/// Target of the `tracing` events emitted by [`Fallback::Tracing`].
pub const FALLBACK_TARGET: &str = "webview_logger::fallback";

/// Where the fallback line for each record goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fallback {
    /// Emit a `tracing` event at the matching level.
    #[default]
    Tracing,
    /// Write a coloured line to stderr.
    Console,
    /// Write nothing.
    Disabled,
}

impl Fallback {
    /// Writes `[Level] message` for `record`. Never fails.
    pub fn write(&self, record: &LogRecord) {
        match self {
            Fallback::Tracing => emit_tracing(record),
            Fallback::Console => {
                let tag = format!("[{}]", record.level());
                eprintln!("{} {}", paint(record.level(), &tag), record.message());
            }
            Fallback::Disabled => {}
        }
    }
}

fn emit_tracing(record: &LogRecord) {
    let source = record.source();
    let category = record.category();
    match record.level() {
        LogLevel::Debug => {
            tracing::debug!(target: FALLBACK_TARGET, source, category, "[{}] {}", record.level(), record.message())
        }
        LogLevel::Info => {
            tracing::info!(target: FALLBACK_TARGET, source, category, "[{}] {}", record.level(), record.message())
        }
        LogLevel::Warning => {
            tracing::warn!(target: FALLBACK_TARGET, source, category, "[{}] {}", record.level(), record.message())
        }
        LogLevel::Error | LogLevel::Critical => {
            tracing::error!(target: FALLBACK_TARGET, source, category, "[{}] {}", record.level(), record.message())
        }
    }
}

fn paint(level: LogLevel, text: &str) -> colored::ColoredString {
    match level {
        LogLevel::Debug => text.dimmed(),
        LogLevel::Info => text.cyan(),
        LogLevel::Warning => text.yellow(),
        LogLevel::Error => text.red(),
        LogLevel::Critical => text.red().bold(),
    }
}

impl FromStr for Fallback {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tracing" => Ok(Fallback::Tracing),
            "console" | "stderr" => Ok(Fallback::Console),
            "off" | "none" | "disabled" => Ok(Fallback::Disabled),
            _ => Err(ConfigError::InvalidFallback {
                name: "fallback",
                value: s.to_string(),
            }),
        }
    }
}
