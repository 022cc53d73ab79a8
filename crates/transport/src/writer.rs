//! StreamWriter - single task owning the outbound sink

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use contracts::{MeasurementRecord, OutboundFrame, StreamSink};
use observability::{RunningStats, StatsSummary};

use crate::metrics::{WriterMetrics, WriterSnapshot};

/// Final writer statistics, returned by `StreamWriter::finish`
#[derive(Debug, Clone, Default)]
pub struct WriterReport {
    /// Counter snapshot taken after the worker stopped
    pub metrics: WriterSnapshot,
    /// Per-frame write latency (ms)
    pub write_latency_ms: StatsSummary,
}

/// Handle to a running writer task
pub struct StreamWriter {
    /// Sink name
    name: String,
    /// Queue into the worker; clones are handed to producers
    tx: Sender<OutboundFrame>,
    /// Shared metrics
    metrics: Arc<WriterMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<RunningStats>,
}

impl StreamWriter {
    /// Spawn the worker task that owns `sink`
    pub fn spawn<S: StreamSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = async_channel::bounded(queue_capacity.max(1));
        let metrics = Arc::new(WriterMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle =
            tokio::spawn(async move { writer_worker(sink, rx, worker_metrics, worker_name).await });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Producer side of the queue
    pub fn sender(&self) -> Sender<OutboundFrame> {
        self.tx.clone()
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<WriterMetrics> {
        &self.metrics
    }

    /// Queue the terminate sentinel, close the queue and wait for the worker
    ///
    /// Frames queued before the sentinel are written first. Anything a
    /// producer manages to queue after it is discarded, so the sentinel is
    /// always the last thing written. The sink is closed exactly once.
    ///
    /// The whole step is bounded by `grace`. A peer that stops reading
    /// stalls the worker; on expiry the worker is aborted, the frames still
    /// queued are counted as discarded and the terminate is not written.
    #[instrument(name = "stream_writer_finish", skip(self), fields(sink = %self.name))]
    pub async fn finish(self, grace: Duration) -> WriterReport {
        let Self {
            name,
            tx,
            metrics,
            mut worker_handle,
        } = self;
        let deadline = tokio::time::Instant::now() + grace;

        let terminate = wire_codec::encode_frame(&MeasurementRecord::Terminate);
        match tokio::time::timeout_at(deadline, tx.send(terminate)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => warn!(sink = %name, "Writer queue closed before terminate was queued"),
            Err(_) => warn!(sink = %name, "Writer queue still full at shutdown, terminate not queued"),
        }
        tx.close();

        let latency = match tokio::time::timeout_at(deadline, &mut worker_handle).await {
            Ok(Ok(latency)) => latency,
            Ok(Err(e)) => {
                error!(sink = %name, error = ?e, "Writer task panicked");
                RunningStats::default()
            }
            Err(_) => {
                worker_handle.abort();
                let stranded = tx.len() as u64;
                metrics.add_discarded(stranded);
                metrics.set_queue_len(0);
                warn!(
                    sink = %name,
                    grace_ms = grace.as_millis() as u64,
                    stranded,
                    "Writer did not drain within the shutdown grace period, aborted"
                );
                RunningStats::default()
            }
        };

        let report = WriterReport {
            metrics: metrics.snapshot(),
            write_latency_ms: latency.summary(),
        };
        debug!(sink = %name, ?report, "StreamWriter finished");
        report
    }
}

/// Worker loop: write frames in queue order until the terminate sentinel
#[instrument(name = "stream_writer_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn writer_worker<S: StreamSink>(
    mut sink: S,
    rx: Receiver<OutboundFrame>,
    metrics: Arc<WriterMetrics>,
    name: String,
) -> RunningStats {
    debug!(sink = %name, "Writer started");
    let mut latency = RunningStats::default();

    while let Ok(frame) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let started = Instant::now();
        let result = sink.write(&frame).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let written = result.is_ok();

        match result {
            Ok(()) => {
                metrics.inc_written(frame.len());
                latency.push(elapsed_ms);
                observability::record_write_latency_ms(elapsed_ms);
                observability::record_frame_written(frame.kind, frame.len(), true);
            }
            Err(e) => {
                metrics.inc_write_failures();
                observability::record_frame_written(frame.kind, frame.len(), false);
                // Only the first failure is worth a warning; the sink stays down
                if metrics.write_failures() == 1 {
                    warn!(sink = %name, kind = %frame.kind, error = %e, "Write failed");
                } else {
                    debug!(sink = %name, kind = %frame.kind, error = %e, "Write failed");
                }
            }
        }

        if frame.is_terminate() {
            if written {
                metrics.set_terminate_written();
            }
            break;
        }
    }

    let leftover = rx.len() as u64;
    rx.close();
    if leftover > 0 {
        metrics.add_discarded(leftover);
        debug!(sink = %name, leftover, "Discarded frames queued after terminate");
    }
    metrics.set_queue_len(0);

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    info!(
        sink = %name,
        frames = metrics.frames_written(),
        bytes = metrics.bytes_written(),
        failures = metrics.write_failures(),
        "Writer stopped"
    );
    latency
}
