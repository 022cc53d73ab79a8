//! SessionContext - immutable streaming decision

use async_channel::{Sender, TrySendError};
use contracts::OutboundFrame;
use tracing::{debug, trace};

use crate::metrics::IngestionMetrics;

/// Outcome of handing a frame to the writer queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Queued for the writer
    Queued,
    /// Streaming disabled; nothing to send
    Disabled,
    /// Queue full, frame dropped (newest)
    Full,
    /// Writer finished, frame dropped
    Closed,
}

/// Whether this session streams, fixed once the connect attempt is over
///
/// Cheap to clone; every clone shares the same writer queue.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    outbound: Option<Sender<OutboundFrame>>,
}

impl SessionContext {
    /// Context for a session without a peer (degraded mode)
    pub fn degraded() -> Self {
        Self { outbound: None }
    }

    /// Context for a session streaming into `tx`
    pub fn streaming(tx: Sender<OutboundFrame>) -> Self {
        Self { outbound: Some(tx) }
    }

    /// Whether a transport was opened for this session
    pub fn is_streaming(&self) -> bool {
        self.outbound.is_some()
    }

    /// Queue a frame for the writer without blocking
    pub fn forward(&self, frame: OutboundFrame, metrics: &IngestionMetrics) -> ForwardOutcome {
        let Some(tx) = &self.outbound else {
            return ForwardOutcome::Disabled;
        };

        let kind = frame.kind;
        match tx.try_send(frame) {
            Ok(()) => {
                metrics.record_forwarded();
                observability::record_frame_forwarded(kind);
                trace!(%kind, "frame queued");
                ForwardOutcome::Queued
            }
            Err(TrySendError::Full(_)) => {
                metrics.record_dropped();
                observability::record_frame_dropped(kind, "queue_full");
                debug!(%kind, "writer queue full, frame dropped");
                ForwardOutcome::Full
            }
            Err(TrySendError::Closed(_)) => {
                metrics.record_dropped();
                observability::record_frame_dropped(kind, "closed");
                debug!(%kind, "writer queue closed, frame dropped");
                ForwardOutcome::Closed
            }
        }
    }
}
