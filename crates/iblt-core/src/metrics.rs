//! Metrics hooks for IBLT operations
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use iblt_core::{Iblt, Metrics};
//!
//! let metrics = Arc::new(Metrics::new());
//! let mut table = Iblt::new(100, 4, 1).unwrap().with_metrics(metrics.clone());
//! table.insert(b"key", b"value");
//! assert_eq!(table.get(b"key"), Some(b"value".to_vec()));
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.inserts, 1);
//! assert_eq!(snapshot.lookups_hit, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collector for IBLT operations
///
/// Atomic counters so one collector can be shared by several tables.
#[derive(Default)]
pub struct Metrics {
    /// Tables created
    pub tables_created: AtomicU64,
    /// Cells allocated across all tables
    pub cells_allocated: AtomicU64,
    /// Insert calls
    pub inserts: AtomicU64,
    /// Delete calls
    pub deletes: AtomicU64,
    /// Lookups performed
    pub lookups: AtomicU64,
    /// Lookups that returned a value
    pub lookups_hit: AtomicU64,
    /// Full decodes attempted
    pub decodes: AtomicU64,
    /// Full decodes that stalled before emptying the table
    pub decodes_incomplete: AtomicU64,
    /// Entries recovered across all decodes
    pub entries_recovered: AtomicU64,
    /// Cumulative lookup time in nanoseconds
    pub lookup_time_ns: AtomicU64,
    /// Cumulative decode time in nanoseconds
    pub decode_time_ns: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_table_created(&self, size: usize, _hash_count: usize) {
        self.tables_created.fetch_add(1, Ordering::Relaxed);
        self.cells_allocated.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a point lookup and whether it produced a value
    pub fn record_lookup(&self, duration: Duration, found: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.lookup_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if found {
            self.lookups_hit.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a full decode
    pub fn record_decode(&self, duration: Duration, recovered: usize, complete: bool) {
        self.decodes.fetch_add(1, Ordering::Relaxed);
        self.decode_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        self.entries_recovered
            .fetch_add(recovered as u64, Ordering::Relaxed);
        if !complete {
            self.decodes_incomplete.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tables_created: self.tables_created.load(Ordering::Relaxed),
            cells_allocated: self.cells_allocated.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            lookups_hit: self.lookups_hit.load(Ordering::Relaxed),
            decodes: self.decodes.load(Ordering::Relaxed),
            decodes_incomplete: self.decodes_incomplete.load(Ordering::Relaxed),
            entries_recovered: self.entries_recovered.load(Ordering::Relaxed),
            avg_lookup_ns: self.avg_lookup_time_ns(),
            avg_decode_ns: self.avg_decode_time_ns(),
        }
    }

    pub fn avg_lookup_time_ns(&self) -> u64 {
        let total = self.lookup_time_ns.load(Ordering::Relaxed);
        let count = self.lookups.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    pub fn avg_decode_time_ns(&self) -> u64 {
        let total = self.decode_time_ns.load(Ordering::Relaxed);
        let count = self.decodes.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Share of lookups that returned a value
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups.load(Ordering::Relaxed);
        let hits = self.lookups_hit.load(Ordering::Relaxed);
        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn reset(&self) {
        self.tables_created.store(0, Ordering::Relaxed);
        self.cells_allocated.store(0, Ordering::Relaxed);
        self.inserts.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.lookups.store(0, Ordering::Relaxed);
        self.lookups_hit.store(0, Ordering::Relaxed);
        self.decodes.store(0, Ordering::Relaxed);
        self.decodes_incomplete.store(0, Ordering::Relaxed);
        self.entries_recovered.store(0, Ordering::Relaxed);
        self.lookup_time_ns.store(0, Ordering::Relaxed);
        self.decode_time_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tables_created: u64,
    pub cells_allocated: u64,
    pub inserts: u64,
    pub deletes: u64,
    pub lookups: u64,
    pub lookups_hit: u64,
    pub decodes: u64,
    pub decodes_incomplete: u64,
    pub entries_recovered: u64,
    pub avg_lookup_ns: u64,
    pub avg_decode_ns: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this to forward IBLT events to an external metrics system.
pub trait MetricsRecorder: Send + Sync {
    fn record_table_created(&self, size: usize, hash_count: usize);

    fn record_insert(&self);

    fn record_delete(&self);

    fn record_lookup(&self, duration: Duration, found: bool);

    fn record_decode(&self, duration: Duration, recovered: usize, complete: bool);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_table_created(&self, _: usize, _: usize) {}
    fn record_insert(&self) {}
    fn record_delete(&self) {}
    fn record_lookup(&self, _: Duration, _: bool) {}
    fn record_decode(&self, _: Duration, _: usize, _: bool) {}
}

impl MetricsRecorder for Metrics {
    fn record_table_created(&self, size: usize, hash_count: usize) {
        Metrics::record_table_created(self, size, hash_count);
    }

    fn record_insert(&self) {
        Metrics::record_insert(self);
    }

    fn record_delete(&self) {
        Metrics::record_delete(self);
    }

    fn record_lookup(&self, duration: Duration, found: bool) {
        Metrics::record_lookup(self, duration, found);
    }

    fn record_decode(&self, duration: Duration, recovered: usize, complete: bool) {
        Metrics::record_decode(self, duration, recovered, complete);
    }
}
