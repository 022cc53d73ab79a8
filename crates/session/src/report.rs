//! Session statistics

use std::time::Duration;

use contracts::EngineStep;
use ingestion::MetricsSnapshot;
use transport::WriterReport;

/// Outcome of a session run
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    /// Whether a transport was opened and frames were streamed
    pub streaming_enabled: bool,

    /// Requested consumer address, if any
    pub target: Option<String>,

    /// Engine steps that failed (setup and subscription commit)
    pub failed_steps: Vec<EngineStep>,

    /// Event adapter counters
    pub ingestion: MetricsSnapshot,

    /// Stream writer outcome, present when streaming
    pub writer: Option<WriterReport>,

    /// Total session duration
    pub duration: Duration,
}

impl SessionReport {
    /// Whether every engine step succeeded
    pub fn engine_setup_ok(&self) -> bool {
        self.failed_steps.is_empty()
    }

    /// Records produced per second
    pub fn records_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.ingestion.records_produced as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Session Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        match &self.target {
            Some(target) if self.streaming_enabled => println!("   ├─ Streaming to: {target}"),
            Some(target) => println!("   ├─ Streaming: disabled ({target} unreachable)"),
            None => println!("   ├─ Streaming: disabled (no target)"),
        }
        if self.engine_setup_ok() {
            println!("   └─ Engine setup: ok");
        } else {
            let steps: Vec<String> = self.failed_steps.iter().map(ToString::to_string).collect();
            println!("   └─ Engine setup: failed ({})", steps.join(", "));
        }

        let ingestion = &self.ingestion;
        println!("\n👁  Events");
        println!("   ├─ Notifications: {}", ingestion.events_received);
        println!("   ├─ Records: {}", ingestion.records_produced);
        println!("   ├─ Records/s: {:.2}", self.records_per_sec());
        println!("   ├─ Payload errors: {}", ingestion.parse_errors);
        println!("   ├─ Queued for sending: {}", ingestion.records_forwarded);
        println!("   └─ Dropped before sending: {}", ingestion.records_dropped);

        if let Some(writer) = &self.writer {
            let metrics = &writer.metrics;
            println!("\n📡 Stream");
            println!("   ├─ Frames written: {}", metrics.frames_written);
            println!("   ├─ Bytes written: {}", metrics.bytes_written);
            println!("   ├─ Write failures: {}", metrics.write_failures);
            println!("   ├─ Discarded after terminate: {}", metrics.discarded);
            println!(
                "   ├─ Terminate sent: {}",
                if metrics.terminate_written { "yes" } else { "no" }
            );
            println!("   └─ Write latency (ms): {}", writer.write_latency_ms);
        }

        println!();
    }
}
