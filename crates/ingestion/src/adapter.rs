//! EventAdapter - engine notifications to wire frames
//!
//! Runs on engine notification threads. Each behavior present in a
//! notification is extracted, logged, and (when streaming) encoded and
//! queued for the stream writer. Nothing here blocks or panics on bad input.

use std::sync::Arc;

use contracts::{BehaviorPayload, BehaviorType, EngineEvent, EngineEventCallback, MeasurementRecord};
use tracing::{info, warn};

use crate::error::IngestionError;
use crate::extract::{EyePositionParams, FixationParams, GazePointParams};
use crate::metrics::IngestionMetrics;
use crate::session::SessionContext;

/// Event adapter
pub struct EventAdapter {
    session: SessionContext,
    metrics: Arc<IngestionMetrics>,
}

impl EventAdapter {
    /// Create an adapter for `session` with fresh metrics
    pub fn new(session: SessionContext) -> Self {
        Self::with_metrics(session, Arc::new(IngestionMetrics::new()))
    }

    /// Create an adapter sharing existing metrics
    pub fn with_metrics(session: SessionContext, metrics: Arc<IngestionMetrics>) -> Self {
        Self { session, metrics }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Wrap the adapter as an engine event callback
    pub fn callback(self: &Arc<Self>) -> EngineEventCallback {
        let adapter = Arc::clone(self);
        Arc::new(move |event| {
            adapter.handle_event(&event);
        })
    }

    /// Process every behavior payload present in one notification
    ///
    /// Payloads are independent: a notification may carry several, even of
    /// the same kind, and a bad one does not affect the others. Records come
    /// out grouped by kind (fixation, gaze point, eye position), each group
    /// in delivery order.
    pub fn handle_event(&self, event: &EngineEvent) -> Vec<MeasurementRecord> {
        self.metrics.record_event();

        BehaviorType::ALL
            .into_iter()
            .flat_map(|behavior| event.behaviors_of(behavior))
            .filter_map(|payload| match payload.behavior_type {
                BehaviorType::Fixation => self.on_fixation(payload),
                BehaviorType::GazePoint => self.on_gaze_point(payload),
                BehaviorType::EyePosition => self.on_eye_position(payload),
            })
            .collect()
    }

    /// Handle a fixation payload
    pub fn on_fixation(&self, payload: &BehaviorPayload) -> Option<MeasurementRecord> {
        let params = self.extract::<FixationParams>(payload)?;
        info!(
            behavior = "fixation",
            subtype = %params.subtype,
            timestamp_ms = params.timestamp_ms,
            "Fixation {}: ({:.1}, {:.1}) time {:.0} ms",
            params.subtype,
            params.x,
            params.y,
            params.timestamp_ms
        );
        Some(self.emit(params.into()))
    }

    /// Handle a gaze point payload
    pub fn on_gaze_point(&self, payload: &BehaviorPayload) -> Option<MeasurementRecord> {
        let params = self.extract::<GazePointParams>(payload)?;
        info!(
            behavior = "gaze_point",
            timestamp_ms = params.timestamp_ms,
            "Gaze Data: ({:.1}, {:.1}) time {:.0} ms",
            params.x,
            params.y,
            params.timestamp_ms
        );
        Some(self.emit(params.into()))
    }

    /// Handle an eye position payload
    pub fn on_eye_position(&self, payload: &BehaviorPayload) -> Option<MeasurementRecord> {
        let params = self.extract::<EyePositionParams>(payload)?;
        let (l, r) = (params.left, params.right);
        info!(
            behavior = "eye_position",
            timestamp_ms = params.timestamp_ms,
            "Eye Position: L({:.1}, {:.1}, {:.1}), R({:.1}, {:.1}, {:.1}), time {:.0} ms",
            l.x,
            l.y,
            l.z,
            r.x,
            r.y,
            r.z,
            params.timestamp_ms
        );
        Some(self.emit(params.into()))
    }

    fn extract<'a, P>(&self, payload: &'a BehaviorPayload) -> Option<P>
    where
        P: TryFrom<&'a BehaviorPayload, Error = IngestionError>,
    {
        observability::record_event_received(payload.behavior_type);
        match P::try_from(payload) {
            Ok(params) => Some(params),
            Err(e) => {
                self.metrics.record_parse_error();
                observability::record_parse_error(payload.behavior_type);
                warn!(
                    behavior = %payload.behavior_type,
                    error = %e,
                    "Failed to interpret {} data event packet",
                    payload.behavior_type
                );
                None
            }
        }
    }

    fn emit(&self, record: MeasurementRecord) -> MeasurementRecord {
        self.metrics.record_produced();
        if self.session.is_streaming() {
            self.session
                .forward(wire_codec::encode_frame(&record), &self.metrics);
        }
        record
    }
}
