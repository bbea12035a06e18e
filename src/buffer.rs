//! This module provides the backup buffer that holds log records while the
//! viewer cannot take them.
//!
//! The buffer is a bounded FIFO: when it is full the oldest record is
//! dropped to make room, so producers never wait on it.
use crate::record::LogRecord;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default number of records kept while the viewer is unavailable.
pub const DEFAULT_BACKUP_CAPACITY: usize = 5000;

/// A bounded, drop-oldest queue of log records.
pub struct BackupBuffer {
    /// The buffered records, oldest first.
    entries: Mutex<VecDeque<LogRecord>>,
    /// The maximum number of records kept.
    capacity: usize,
    /// How many records have been evicted to honour `capacity`.
    dropped: AtomicU64,
}

impl BackupBuffer {
    /// Creates a new `BackupBuffer`.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The maximum number of records to keep. A capacity of
    ///   zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Appends a record, evicting the oldest ones while over capacity.
    ///
    /// Returns the number of records evicted by this call.
    pub fn push(&self, record: LogRecord) -> usize {
        let mut evicted = 0;
        {
            let mut entries = self.lock();
            entries.push_back(record);
            while entries.len() > self.capacity {
                entries.pop_front();
                evicted += 1;
            }
        }

        if evicted > 0 {
            self.dropped.fetch_add(evicted as u64, Ordering::Relaxed);
        }
        evicted
    }

    /// Removes and returns the oldest record.
    pub fn pop(&self) -> Option<LogRecord> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of records evicted since the buffer was created.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Returns a copy of the buffered records, oldest first.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BackupBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BACKUP_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CallSite, LogLevel};
    use serde_json::Value;
    use std::sync::Arc;

    fn record(n: usize) -> LogRecord {
        LogRecord::new(
            LogLevel::Info,
            format!("record {}", n),
            None,
            None,
            &CallSite::new("buffer.rs", "record", 1),
            1,
            Value::Null,
        )
    }

    #[test]
    fn test_fifo_order() {
        let buffer = BackupBuffer::new(10);
        for n in 0..3 {
            buffer.push(record(n));
        }
        assert_eq!(buffer.pop().unwrap().message(), "record 0");
        assert_eq!(buffer.pop().unwrap().message(), "record 1");
        assert_eq!(buffer.pop().unwrap().message(), "record 2");
        assert!(buffer.pop().is_none());
    }

    #[test]
    fn test_overflow_keeps_most_recent() {
        let buffer = BackupBuffer::default();
        for n in 0..6000 {
            buffer.push(record(n));
        }

        assert_eq!(buffer.len(), 5000);
        assert_eq!(buffer.dropped(), 1000);

        let kept = buffer.snapshot();
        assert_eq!(kept.first().unwrap().message(), "record 1000");
        assert_eq!(kept.last().unwrap().message(), "record 5999");
        assert!(kept.iter().all(|r| r.message() != "record 999"));
    }

    #[test]
    fn test_push_reports_evictions() {
        let buffer = BackupBuffer::new(2);
        assert_eq!(buffer.push(record(0)), 0);
        assert_eq!(buffer.push(record(1)), 0);
        assert_eq!(buffer.push(record(2)), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_concurrent_producers_respect_capacity() {
        let buffer = Arc::new(BackupBuffer::new(100));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let buffer = buffer.clone();
                std::thread::spawn(move || {
                    for n in 0..250 {
                        buffer.push(record(t * 1000 + n));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.dropped(), 900);
    }
}
