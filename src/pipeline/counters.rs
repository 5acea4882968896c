//! Pipeline counters: lock-free, shared by every stage.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::CounterSnapshot;

/// Monotonic counters. Every parsed triple ends up in exactly one of `processed` or `ignored`.
#[derive(Debug, Default)]
pub struct Counters {
    read: AtomicU64,
    parsed: AtomicU64,
    processed: AtomicU64,
    ignored: AtomicU64,
}

impl Counters {
    pub fn incr_read(&self) {
        self.read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_parsed(&self) {
        self.parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read(&self) -> u64 {
        self.read.load(Ordering::Relaxed)
    }

    pub fn parsed(&self) -> u64 {
        self.parsed.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }

    /// Copy all counters. `len_cnq` is filled in by the caller that owns the queue.
    ///
    /// The loads are independent, so while the pipeline runs `pending` may briefly lag; it saturates at 0.
    pub fn snapshot(&self, len_cnq: usize) -> CounterSnapshot {
        let processed = self.processed();
        let ignored = self.ignored();
        let parsed = self.parsed();
        CounterSnapshot {
            read: self.read(),
            parsed,
            processed,
            ignored,
            pending: parsed.saturating_sub(ignored).saturating_sub(processed),
            len_cnq,
        }
    }
}
