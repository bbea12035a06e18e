//! This module defines the interface between the logger and the component
//! that delivers serialized records to viewers.
use crate::error::ChannelError;
use std::sync::Arc;

/// Lifecycle of a delivery channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
}

impl ChannelState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => ChannelState::Starting,
            2 => ChannelState::Running,
            _ => ChannelState::Stopped,
        }
    }
}

/// A sink for serialized log records that viewers subscribe to.
///
/// Implementations are shared between producer threads, so every method
/// takes `&self` and must return promptly.
pub trait LogChannel: Send + Sync {
    /// Starts serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot start; the channel is then left
    /// stopped.
    fn start(&self) -> Result<(), ChannelError>;

    /// Stops serving. Calling this on a stopped channel does nothing.
    fn stop(&self);

    /// Queues one serialized record for delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot take the entry, which the
    /// logger treats as the channel being unhealthy.
    fn add_log_entry(&self, payload: String) -> Result<(), ChannelError>;

    /// The current lifecycle state.
    fn state(&self) -> ChannelState;

    /// The port the channel was configured with.
    fn port(&self) -> u16;

    /// The port actually bound while running, which differs from `port()`
    /// when the channel was configured with port 0.
    fn local_port(&self) -> Option<u16> {
        None
    }
}

/// Creates delivery channels for a logger.
pub trait ChannelFactory: Send + Sync {
    /// Creates a channel for `port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be constructed.
    fn create(&self, port: u16) -> Result<Arc<dyn LogChannel>, ChannelError>;
}

impl<F> ChannelFactory for F
where
    F: Fn(u16) -> Result<Arc<dyn LogChannel>, ChannelError> + Send + Sync,
{
    fn create(&self, port: u16) -> Result<Arc<dyn LogChannel>, ChannelError> {
        self(port)
    }
}
