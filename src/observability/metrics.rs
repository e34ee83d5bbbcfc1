//! Metrics registry
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Shared by `Arc` between the server and every paginator it builds

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters
///
/// Relaxed ordering throughout; counters are independent of each other.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    pages_served: AtomicU64,
    chunk_requests: AtomicU64,
    records_read: AtomicU64,
    backend_failures: AtomicU64,
    cancelled_scans: AtomicU64,
    items_written: AtomicU64,
    items_deleted: AtomicU64,
    requests_handled: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_pages_served(&self) {
        self.pages_served.fetch_add(1, Ordering::Relaxed);
    }

    /// One successful chunk call returning `records` records
    pub fn record_chunk(&self, records: u64) {
        self.chunk_requests.fetch_add(1, Ordering::Relaxed);
        self.records_read.fetch_add(records, Ordering::Relaxed);
    }

    pub fn increment_backend_failures(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cancelled_scans(&self) {
        self.cancelled_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_items_written(&self, count: u64) {
        self.items_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_items_deleted(&self) {
        self.items_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_handled(&self) {
        self.requests_handled.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pages_served: self.pages_served.load(Ordering::Relaxed),
            chunk_requests: self.chunk_requests.load(Ordering::Relaxed),
            records_read: self.records_read.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
            cancelled_scans: self.cancelled_scans.load(Ordering::Relaxed),
            items_written: self.items_written.load(Ordering::Relaxed),
            items_deleted: self.items_deleted.load(Ordering::Relaxed),
            requests_handled: self.requests_handled.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pages_served: u64,
    pub chunk_requests: u64,
    pub records_read: u64,
    pub backend_failures: u64,
    pub cancelled_scans: u64,
    pub items_written: u64,
    pub items_deleted: u64,
    pub requests_handled: u64,
}
