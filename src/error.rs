//! Error types for the viewer channel, record delivery and configuration.
//!
//! None of these escape the public logging calls; they drive the
//! dispatch and recovery decisions and end up in diagnostics.
use thiserror::Error;

/// Failures of the delivery channel itself.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The HTTP listener could not be bound.
    #[error("failed to bind log viewer on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The runtime hosting the server could not be created.
    #[error("failed to create log viewer runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The channel is not in the running state.
    #[error("log viewer is not running")]
    NotRunning,

    /// The channel refused the entry for another reason.
    #[error("log viewer rejected entry: {0}")]
    Rejected(String),
}

impl ChannelError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// The result of trying to hand one record to the channel.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Malformed configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {name}: expected a port number")]
    InvalidPort { name: &'static str, value: String },

    #[error("invalid value '{value}' for {name}: expected true or false")]
    InvalidFlag { name: &'static str, value: String },

    #[error("invalid value '{value}' for {name}: expected tracing, console or off")]
    InvalidFallback { name: &'static str, value: String },
}
