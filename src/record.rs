//! This module defines the log record sent to the viewer and the small value
//! types it is built from.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source used when the caller does not name one.
pub const DEFAULT_SOURCE: &str = "Unknown";
/// Category used when the caller does not name one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Severity of a log record, ordered from least to most severe.
///
/// Serialized as the variant name (`"Info"`, `"Warning"`, ...), which is what
/// the dashboard filters on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// All levels, least severe first.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "Debug",
            LogLevel::Info => "Info",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for LogLevel {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warning,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

/// Where a log call was made from.
///
/// Rendered as `file:function:line`, where `file` is the bare file name.
/// The function part is empty when it is not known, e.g. for call sites
/// captured through `#[track_caller]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    file: String,
    function: String,
    line: u32,
}

impl CallSite {
    pub fn new(file: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            function: function.into(),
            line,
        }
    }

    /// Builds a call site from a compiler-provided location.
    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), "", location.line())
    }

    /// Captures the location of the caller of the enclosing `#[track_caller]` chain.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_name = Path::new(&self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file);
        write!(f, "{}:{}:{}", file_name, self.function, self.line)
    }
}

/// Extracts the enclosing function name from the type name of a nested item.
///
/// Used by [`callsite!`](crate::callsite); not meant to be called directly.
#[doc(hidden)]
pub fn enclosing_function(type_name: &str) -> &str {
    let path = type_name.strip_suffix("::__here").unwrap_or(type_name);
    let path = path.trim_end_matches("::{{closure}}");
    path.rsplit("::").next().unwrap_or(path)
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Returns a small integer that identifies the current thread for the
/// lifetime of the process.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// A single log event as it travels to the viewer.
///
/// Records are immutable once built; the JSON form uses the PascalCase keys
/// the dashboard expects.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LogRecord {
    id: Uuid,
    timestamp: DateTime<Utc>,
    level: LogLevel,
    message: String,
    source: String,
    category: String,
    location: String,
    thread_id: u64,
    #[serde(default)]
    data: Value,
}

impl LogRecord {
    /// Creates a record stamped with a fresh id and the current time.
    ///
    /// Missing source and category fall back to [`DEFAULT_SOURCE`] and
    /// [`DEFAULT_CATEGORY`].
    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
        source: Option<String>,
        category: Option<String>,
        location: &CallSite,
        thread_id: u64,
        data: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
            source: source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            category: category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            location: location.to_string(),
            thread_id,
            data,
        }
    }

    /// An internal record produced by the logger itself.
    #[track_caller]
    pub(crate) fn system(level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(
            level,
            message,
            Some("System".to_string()),
            Some("Logging".to_string()),
            &CallSite::caller(),
            current_thread_id(),
            Value::Null,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Serializes the record into its wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
