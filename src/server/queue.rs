//! The outbound queue shared by the server and its stream handlers.
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Serialized records waiting to be written to a live stream.
///
/// The queue is unbounded and shared: every connected stream drains it, so
/// with several subscribers each payload goes to whichever one wakes first.
#[derive(Default)]
pub struct OutboundQueue {
    payloads: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a payload and wakes every waiting stream handler.
    pub fn push(&self, payload: String) {
        self.lock().push_back(payload);
        self.notify.notify_waiters();
    }

    /// Takes every queued payload, oldest first.
    pub fn drain(&self) -> Vec<String> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// A future that completes on the next `push`.
    ///
    /// Only pushes made after the future is enabled (or first polled) wake it,
    /// so callers enable it before draining.
    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
