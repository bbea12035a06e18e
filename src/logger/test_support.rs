//! In-memory channel used to drive the logger through failures.
use crate::channel::{ChannelFactory, ChannelState, LogChannel};
use crate::config::LoggerConfig;
use crate::error::ChannelError;
use crate::fallback::Fallback;
use crate::record::LogRecord;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) fn test_config() -> LoggerConfig {
    LoggerConfig::default()
        .with_port(0)
        .with_fallback(Fallback::Disabled)
}

#[derive(Default)]
pub(crate) struct FakeChannel {
    port: u16,
    state: AtomicU8,
    fail_send: AtomicBool,
    fail_start: AtomicBool,
    send_budget: Mutex<Option<usize>>,
    sent: Mutex<Vec<String>>,
    start_attempts: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl FakeChannel {
    pub(crate) fn fail_sends(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_starts(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Lets the next `count` sends through, then fails every send.
    pub(crate) fn allow_sends(&self, count: usize) {
        *self.send_budget.lock().unwrap() = Some(count);
    }

    pub(crate) fn sent_records(&self) -> Vec<LogRecord> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|payload| serde_json::from_str(payload).unwrap())
            .collect()
    }

    pub(crate) fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub(crate) fn start_attempts(&self) -> usize {
        self.start_attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl LogChannel for FakeChannel {
    fn start(&self) -> Result<(), ChannelError> {
        self.start_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            self.state.store(ChannelState::Stopped as u8, Ordering::SeqCst);
            return Err(ChannelError::rejected("start refused"));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.state.store(ChannelState::Running as u8, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.state.store(ChannelState::Stopped as u8, Ordering::SeqCst);
    }

    fn add_log_entry(&self, payload: String) -> Result<(), ChannelError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ChannelError::rejected("send refused"));
        }
        if self.state() != ChannelState::Running {
            return Err(ChannelError::NotRunning);
        }
        let mut budget = self.send_budget.lock().unwrap();
        match budget.as_mut() {
            Some(0) => return Err(ChannelError::rejected("send budget exhausted")),
            Some(left) => *left -= 1,
            None => {}
        }
        self.sent.lock().unwrap().push(payload);
        Ok(())
    }

    fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn port(&self) -> u16 {
        self.port
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeFactory {
    fail_start: bool,
    created: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<Arc<FakeChannel>>>>,
}

impl FakeFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Channels from this factory refuse to start until told otherwise.
    pub(crate) fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// The most recently created channel.
    pub(crate) fn channel(&self) -> Option<Arc<FakeChannel>> {
        self.last.lock().unwrap().clone()
    }
}

impl ChannelFactory for FakeFactory {
    fn create(&self, port: u16) -> Result<Arc<dyn LogChannel>, ChannelError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let channel = Arc::new(FakeChannel {
            port,
            ..FakeChannel::default()
        });
        channel.fail_starts(self.fail_start);
        *self.last.lock().unwrap() = Some(channel.clone());
        Ok(channel)
    }
}
