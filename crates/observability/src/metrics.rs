//! Stream metrics
//!
//! Thin wrappers over the `metrics` facade so metric names and labels stay
//! consistent across crates, plus an online statistics helper for reports.

use contracts::{BehaviorType, ConnectionState, RecordKind};
use metrics::{counter, gauge, histogram};

/// Record an engine behavior payload received
pub fn record_event_received(behavior: BehaviorType) {
    counter!(
        "eyestream_events_received_total",
        "behavior" => behavior.as_str()
    )
    .increment(1);
}

/// Record a payload that failed extraction or validation
pub fn record_parse_error(behavior: BehaviorType) {
    counter!(
        "eyestream_payload_parse_errors_total",
        "behavior" => behavior.as_str()
    )
    .increment(1);
}

/// Record an encoded record handed to the stream writer
pub fn record_frame_forwarded(kind: RecordKind) {
    counter!(
        "eyestream_frames_forwarded_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record a frame dropped before reaching the writer
///
/// `reason` is `queue_full` or `closed`.
pub fn record_frame_dropped(kind: RecordKind, reason: &'static str) {
    counter!(
        "eyestream_frames_dropped_total",
        "kind" => kind.as_str(),
        "reason" => reason
    )
    .increment(1);
}

/// Record a frame write attempt on the transport
pub fn record_frame_written(kind: RecordKind, bytes: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "eyestream_frames_written_total",
        "kind" => kind.as_str(),
        "status" => status
    )
    .increment(1);
    if success {
        counter!("eyestream_bytes_written_total").increment(bytes as u64);
    }
}

/// Record time spent in one transport write (ms)
pub fn record_write_latency_ms(latency_ms: f64) {
    histogram!("eyestream_write_latency_ms").record(latency_ms);
}

/// Record whether the session streams to a peer
pub fn record_streaming_enabled(enabled: bool) {
    gauge!("eyestream_streaming_enabled").set(if enabled { 1.0 } else { 0.0 });
}

/// Record the latest engine connection state
pub fn record_connection_state(state: ConnectionState) {
    gauge!("eyestream_engine_connection_state").set(state.as_gauge());
    counter!(
        "eyestream_engine_state_changes_total",
        "state" => state.to_string()
    )
    .increment(1);
}

/// Summary of a `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Snapshot for reporting
    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
