//! Stream writer metrics

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Counters shared between the writer task and its handle
#[derive(Debug, Default)]
pub struct WriterMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Frames fully written
    frames_written: AtomicU64,
    /// Bytes fully written
    bytes_written: AtomicU64,
    /// Frames whose write failed
    write_failures: AtomicU64,
    /// Frames still queued when the worker stopped
    discarded: AtomicU64,
    /// Whether the terminate sentinel reached the sink
    terminate_written: AtomicBool,
}

impl WriterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Count one successful write of `bytes` bytes
    pub fn inc_written(&self, bytes: usize) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn inc_write_failures(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn add_discarded(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn terminate_written(&self) -> bool {
        self.terminate_written.load(Ordering::Relaxed)
    }

    pub fn set_terminate_written(&self) {
        self.terminate_written.store(true, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> WriterSnapshot {
        WriterSnapshot {
            queue_len: self.queue_len(),
            frames_written: self.frames_written(),
            bytes_written: self.bytes_written(),
            write_failures: self.write_failures(),
            discarded: self.discarded(),
            terminate_written: self.terminate_written(),
        }
    }
}

/// Snapshot of writer metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterSnapshot {
    pub queue_len: usize,
    pub frames_written: u64,
    pub bytes_written: u64,
    pub write_failures: u64,
    pub discarded: u64,
    pub terminate_written: bool,
}
