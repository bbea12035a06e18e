//! Recovery of a failed viewer and forwarding of buffered records.
use super::Logger;
use crate::record::{LogLevel, LogRecord};
use std::sync::atomic::Ordering;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Allows at most one recovery attempt per cool-down window, measured from
/// the previous attempt.
#[derive(Debug)]
pub struct RecoveryGate {
    cooldown: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl RecoveryGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_attempt: Mutex::new(None),
        }
    }

    /// Whether the cool-down since the last attempt has elapsed.
    pub fn can_attempt(&self) -> bool {
        match *self.last_attempt.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(last) => last.elapsed() >= self.cooldown,
            None => true,
        }
    }

    /// Claims the current window. Returns `false` if an attempt already
    /// happened within the cool-down; the check and the claim are atomic, so
    /// concurrent callers get at most one `true`.
    pub fn try_begin(&self) -> bool {
        let mut last = self
            .last_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(at) if at.elapsed() < self.cooldown => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }

    /// Time left until the next attempt is allowed.
    pub fn time_until_next(&self) -> Duration {
        match *self.last_attempt.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(last) => self.cooldown.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }
}

impl Logger {
    /// Restarts the channel and, if that works, forwards the backup buffer.
    ///
    /// Callers claim the [`RecoveryGate`] first.
    pub(crate) fn recover(&self) {
        self.recovery_attempts.fetch_add(1, Ordering::SeqCst);
        let Some(channel) = self.channel() else {
            return;
        };

        info!(buffered = self.backup.len(), "Attempting to recover log viewer");
        channel.stop();

        match channel.start() {
            Ok(()) => {
                self.operational.store(true, Ordering::SeqCst);
                self.drain_backup();
                if self.is_operational() {
                    self.emit(LogRecord::system(
                        LogLevel::Info,
                        "Log viewer recovered successfully",
                    ));
                }
            }
            Err(e) => {
                self.operational.store(false, Ordering::SeqCst);
                error!(error = %e, "Failed to recover log viewer");
            }
        }
    }

    /// Forwards buffered records oldest first.
    ///
    /// Stops at the first failure: that record is dropped, the rest stay
    /// buffered and the logger is marked non-operational. Records added
    /// while draining wait for the next drain.
    pub(crate) fn drain_backup(&self) -> usize {
        if !self.is_initialized() || !self.is_operational() {
            return 0;
        }

        let pending = self.backup.len();
        let mut forwarded = 0;
        for _ in 0..pending {
            let Some(record) = self.backup.pop() else {
                break;
            };
            if let Err(e) = self.deliver(&record) {
                self.operational.store(false, Ordering::SeqCst);
                warn!(
                    error = %e,
                    forwarded,
                    remaining = self.backup.len(),
                    "Failed to forward backup logs"
                );
                return forwarded;
            }
            forwarded += 1;
        }

        if forwarded > 0 {
            info!(count = forwarded, "Forwarded backup logs to the viewer");
        }
        forwarded
    }
}
