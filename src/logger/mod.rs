//! The logger: the entry point producers call, and the owner of the viewer
//! channel and the backup buffer.
//!
//! Every call writes a local fallback line first and then tries the viewer.
//! When the viewer cannot take a record, the record is kept in the backup
//! buffer and a rate-limited recovery is attempted from the logging path
//! itself; there is no background timer.
mod exception;
mod options;
mod recovery;

pub use exception::exception_payload;
pub use options::LogOptions;
pub use recovery::RecoveryGate;

use crate::buffer::BackupBuffer;
use crate::channel::{ChannelFactory, LogChannel};
use crate::config::LoggerConfig;
use crate::error::{ChannelError, DeliveryError};
use crate::record::{current_thread_id, CallSite, LogLevel, LogRecord};
use crate::server::ViewerServer;
use serde_json::Value;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use tracing::warn;

/// A log sink that streams records to the browser viewer and falls back to
/// a bounded buffer while the viewer is unavailable.
///
/// A `Logger` is an ordinary value: create one, share it (usually in an
/// `Arc`) with the code that logs, and shut it down when done. None of its
/// methods panic or return errors; failures only change where records end
/// up.
pub struct Logger {
    config: LoggerConfig,
    port: AtomicU16,
    auto_recover: AtomicBool,
    initialized: AtomicBool,
    operational: AtomicBool,
    shutdown_requested: AtomicBool,
    init_lock: Mutex<()>,
    channel: RwLock<Option<Arc<dyn LogChannel>>>,
    factory: Box<dyn ChannelFactory>,
    backup: BackupBuffer,
    gate: RecoveryGate,
    recovery_attempts: AtomicU64,
}

impl Logger {
    /// Creates a logger whose viewer is a [`ViewerServer`].
    ///
    /// Nothing is started until [`initialize`](Self::initialize) or the
    /// first log call.
    pub fn new(config: LoggerConfig) -> Self {
        let keepalive = config.keepalive_interval;
        Self::with_factory(config, move |port: u16| {
            ViewerServer::with_keepalive(port, keepalive)
                .map(|server| Arc::new(server) as Arc<dyn LogChannel>)
        })
    }

    /// Creates a logger that obtains its delivery channel from `factory`.
    pub fn with_factory<F>(config: LoggerConfig, factory: F) -> Self
    where
        F: ChannelFactory + 'static,
    {
        Self {
            port: AtomicU16::new(config.port),
            auto_recover: AtomicBool::new(config.auto_recover),
            initialized: AtomicBool::new(false),
            operational: AtomicBool::new(false),
            shutdown_requested: AtomicBool::new(false),
            init_lock: Mutex::new(()),
            channel: RwLock::new(None),
            factory: Box::new(factory),
            backup: BackupBuffer::new(config.backup_capacity),
            gate: RecoveryGate::new(config.recovery_cooldown),
            recovery_attempts: AtomicU64::new(0),
            config,
        }
    }

    /// Starts the viewer with the current port and recovery setting.
    ///
    /// See [`initialize_with`](Self::initialize_with).
    pub fn initialize(&self) -> bool {
        self.initialize_with(self.port(), self.auto_recover())
    }

    /// Starts the viewer on `port`.
    ///
    /// Returns `true` once the viewer is running, immediately if it already
    /// was. On failure the logger stays uninitialized, keeps buffering, and
    /// retries on later log calls.
    pub fn initialize_with(&self, port: u16, auto_recover: bool) -> bool {
        let _guard = self.lock_init();
        self.initialize_locked(port, auto_recover)
    }

    fn initialize_locked(&self, port: u16, auto_recover: bool) -> bool {
        if self.is_initialized() {
            return true;
        }

        self.port.store(port, Ordering::SeqCst);
        self.auto_recover.store(auto_recover, Ordering::SeqCst);
        self.shutdown_requested.store(false, Ordering::SeqCst);

        let started = self
            .channel_for(port)
            .and_then(|channel| channel.start());

        match started {
            Ok(()) => {
                self.initialized.store(true, Ordering::SeqCst);
                self.operational.store(true, Ordering::SeqCst);

                let message = format!("Logger initialized, viewer at {}", self.viewer_url());
                self.emit(LogRecord::system(LogLevel::Info, message));
                self.drain_backup();
                true
            }
            Err(e) => {
                warn!(port, error = %e, "Failed to initialize logger");
                self.initialized.store(false, Ordering::SeqCst);
                self.operational.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Initialization attempted from the logging path. Skipped when another
    /// thread is already initializing.
    fn lazy_initialize(&self) {
        let _guard = match self.init_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        self.initialize_locked(self.port(), self.auto_recover());
    }

    /// Returns the channel for `port`, reusing the current one when it was
    /// created for the same port.
    fn channel_for(&self, port: u16) -> Result<Arc<dyn LogChannel>, ChannelError> {
        let mut slot = self
            .channel
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(channel) = slot.as_ref() {
            if channel.port() == port {
                return Ok(channel.clone());
            }
            channel.stop();
        }

        let channel = self.factory.create(port)?;
        *slot = Some(channel.clone());
        Ok(channel)
    }

    pub(crate) fn channel(&self) -> Option<Arc<dyn LogChannel>> {
        self.channel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_init(&self) -> MutexGuard<'_, ()> {
        self.init_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logs a message.
    ///
    /// The call site defaults to the caller's file and line.
    #[track_caller]
    pub fn log(&self, message: impl Into<String>, level: LogLevel, options: LogOptions) {
        let caller = Location::caller();
        let LogOptions {
            source,
            category,
            data,
            thread_id,
            callsite,
        } = options;
        let callsite = callsite.unwrap_or_else(|| CallSite::from_location(caller));

        let record = LogRecord::new(
            level,
            message,
            source,
            category,
            &callsite,
            thread_id.unwrap_or_else(current_thread_id),
            data.unwrap_or(Value::Null),
        );
        self.emit(record);
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, options: LogOptions) {
        self.log(message, LogLevel::Debug, options);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, options: LogOptions) {
        self.log(message, LogLevel::Info, options);
    }

    #[track_caller]
    pub fn warning(&self, message: impl Into<String>, options: LogOptions) {
        self.log(message, LogLevel::Warning, options);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>, options: LogOptions) {
        self.log(message, LogLevel::Error, options);
    }

    #[track_caller]
    pub fn critical(&self, message: impl Into<String>, options: LogOptions) {
        self.log(message, LogLevel::Critical, options);
    }

    /// Writes the fallback line and dispatches the record.
    pub(crate) fn emit(&self, record: LogRecord) {
        self.config.fallback.write(&record);
        self.dispatch(record);
    }

    fn dispatch(&self, record: LogRecord) {
        if self.is_initialized() && self.is_operational() {
            if let Err(e) = self.deliver(&record) {
                self.operational.store(false, Ordering::SeqCst);
                warn!(error = %e, "Log viewer failed, buffering records");

                self.backup.push(LogRecord::system(
                    LogLevel::Error,
                    format!("Log viewer failed: {}", e),
                ));
                self.backup.push(record);
                self.maybe_recover();
            }
            return;
        }

        self.backup.push(record);

        if !self.is_initialized() {
            if !self.shutdown_requested.load(Ordering::SeqCst) {
                self.lazy_initialize();
            }
        } else if !self.is_operational() {
            self.maybe_recover();
        }
    }

    /// Serializes a record and hands it to the channel.
    pub(crate) fn deliver(&self, record: &LogRecord) -> Result<(), DeliveryError> {
        let channel = self.channel().ok_or(ChannelError::NotRunning)?;
        let payload = record.to_json()?;
        channel.add_log_entry(payload)?;
        Ok(())
    }

    fn maybe_recover(&self) {
        if self.auto_recover() && self.gate.try_begin() {
            self.recover();
        }
    }

    /// The address of the dashboard.
    pub fn viewer_url(&self) -> String {
        let port = self
            .channel()
            .and_then(|channel| channel.local_port())
            .unwrap_or_else(|| self.port());
        format!("http://localhost:{}/", port)
    }

    /// Stops the viewer. Logging afterwards only buffers until the logger is
    /// initialized again.
    pub fn shutdown(&self) {
        let _guard = self.lock_init();
        self.shutdown_requested.store(true, Ordering::SeqCst);

        let channel = self
            .channel
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(channel) = channel {
            channel.stop();
        }

        self.initialized.store(false, Ordering::SeqCst);
        self.operational.store(false, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Whether the viewer is currently believed to be healthy.
    pub fn is_operational(&self) -> bool {
        self.operational.load(Ordering::SeqCst)
    }

    pub fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    pub fn auto_recover(&self) -> bool {
        self.auto_recover.load(Ordering::SeqCst)
    }

    /// Records waiting for the viewer.
    pub fn backup(&self) -> &BackupBuffer {
        &self.backup
    }

    /// Number of recovery attempts made so far.
    pub fn recovery_attempts(&self) -> u64 {
        self.recovery_attempts.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod test_support;
