//! Severity-partitioned in-memory retention
//!
//! Two partitions behind a single mutex: an unbounded error partition and
//! a capacity-bounded FIFO partition for everything below Error. Entries
//! live here until evicted or until the process ends; durability only
//! happens through an explicit export.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::severity::Severity;

/// A single retained log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Wall-clock time the entry was recorded
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub category: String,
    pub message: String,
    /// Stack trace attached to error entries, verbatim from the source
    pub stack_trace: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current time
    pub fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            category: category.into(),
            message: message.into(),
            stack_trace: None,
        }
    }

    /// Attach a stack trace to this entry
    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }
}

/// Point-in-time copy of both partitions
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub errors: Vec<LogEntry>,
    pub general: Vec<LogEntry>,
}

struct Partitions {
    errors: Vec<LogEntry>,
    general: VecDeque<LogEntry>,
}

/// Thread-safe two-partition retention store
///
/// Error entries are kept without bound; no error that reaches the store
/// is ever dropped. All other entries share a FIFO buffer that evicts its
/// oldest entry once `general_capacity` is exceeded. Both partitions sit
/// behind one lock, so `record` is atomic with respect to `snapshot`.
pub struct RetentionStore {
    inner: Mutex<Partitions>,
    general_capacity: usize,
}

impl RetentionStore {
    pub fn new(general_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Partitions {
                errors: Vec::new(),
                general: VecDeque::with_capacity(general_capacity),
            }),
            general_capacity,
        }
    }

    /// Capacity of the general partition
    pub fn general_capacity(&self) -> usize {
        self.general_capacity
    }

    /// Record an entry into the partition matching its severity
    pub fn record(&self, entry: LogEntry) {
        let mut inner = self.lock();
        if entry.severity == Severity::Error {
            inner.errors.push(entry);
            return;
        }
        inner.general.push_back(entry);
        while inner.general.len() > self.general_capacity {
            inner.general.pop_front();
        }
    }

    /// Coherent copy of both partitions, safe to format without the lock
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.lock();
        StoreSnapshot {
            errors: inner.errors.clone(),
            general: inner.general.iter().cloned().collect(),
        }
    }

    /// Current `(error, general)` entry counts
    pub fn counts(&self) -> (usize, usize) {
        let inner = self.lock();
        (inner.errors.len(), inner.general.len())
    }

    // A poisoned mutex still holds coherent partitions; keep the store
    // usable after a panicking thread.
    fn lock(&self) -> MutexGuard<'_, Partitions> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn general(message: &str) -> LogEntry {
        LogEntry::new(Severity::Info, "Test", message)
    }

    fn error(message: &str) -> LogEntry {
        LogEntry::new(Severity::Error, "Test", message)
    }

    #[test]
    fn test_general_capacity_never_exceeded() {
        let store = RetentionStore::new(3);
        for i in 0..10 {
            store.record(general(&format!("msg {}", i)));
            let (_, general_count) = store.counts();
            assert!(general_count <= 3);
        }
    }

    #[test]
    fn test_eviction_keeps_most_recent_in_order() {
        let store = RetentionStore::new(2);
        store.record(general("A"));
        store.record(general("B"));
        store.record(general("C"));

        let snapshot = store.snapshot();
        let messages: Vec<&str> = snapshot.general.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["B", "C"]);
    }

    #[test]
    fn test_errors_are_never_evicted() {
        let store = RetentionStore::new(2);
        for i in 0..50 {
            store.record(error(&format!("err {}", i)));
        }

        let (error_count, general_count) = store.counts();
        assert_eq!(error_count, 50);
        assert_eq!(general_count, 0);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.errors[0].message, "err 0");
        assert_eq!(snapshot.errors[49].message, "err 49");
    }

    #[test]
    fn test_warning_goes_to_general_partition() {
        let store = RetentionStore::new(5);
        store.record(LogEntry::new(Severity::Warning, "Test", "careful"));

        let (error_count, general_count) = store.counts();
        assert_eq!(error_count, 0);
        assert_eq!(general_count, 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = RetentionStore::new(5);
        store.record(general("one"));

        let snapshot = store.snapshot();
        store.record(general("two"));

        assert_eq!(snapshot.general.len(), 1);
        assert_eq!(store.counts(), (0, 2));
    }

    #[test]
    fn test_concurrent_record_preserves_invariants() {
        let store = Arc::new(RetentionStore::new(16));
        let mut handles = Vec::new();

        for t in 0..4 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    store.record(LogEntry::new(Severity::Info, "Load", format!("{}:{}", t, i)));
                    store.record(LogEntry::new(Severity::Error, "Load", format!("{}:{}", t, i)));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let (error_count, general_count) = store.counts();
        assert_eq!(error_count, 400);
        assert_eq!(general_count, 16);
    }

    #[test]
    fn test_stack_trace_round_trip() {
        let store = RetentionStore::new(2);
        store.record(error("boom").with_stack_trace("at main\nat start"));

        let snapshot = store.snapshot();
        assert_eq!(
            snapshot.errors[0].stack_trace.as_deref(),
            Some("at main\nat start")
        );
    }
}
