//! Event adapter counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics, shared by every engine notification thread
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Engine notifications handled
    pub events_received: AtomicU64,

    /// Behavior payloads turned into records
    pub records_produced: AtomicU64,

    /// Behavior payloads that failed extraction
    pub parse_errors: AtomicU64,

    /// Encoded records accepted by the writer queue
    pub records_forwarded: AtomicU64,

    /// Encoded records rejected by the writer queue (full or closed)
    pub records_dropped: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_produced(&self) {
        self.records_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.records_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            records_produced: self.records_produced.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            records_forwarded: self.records_forwarded.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub records_produced: u64,
    pub parse_errors: u64,
    pub records_forwarded: u64,
    pub records_dropped: u64,
}
