//! Replay engine - plays back recorded engine events
//!
//! Recordings are JSON lines, one notification per line:
//!
//! ```text
//! {"at_ms": 0.0, "behaviors": [{"behavior_type": "gaze_point", "params": {"timestamp": 1000.0, "x": 10.0, "y": 20.0}}]}
//! ```
//!
//! `at_ms` is the delivery time relative to the first recorded event.
//! A looping replay restarts one average event interval after the last
//! event, and never more often than every `MIN_LOOP_PERIOD`.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    ConnectionStateCallback, ContractError, EngineEvent, EngineEventCallback, EngineStep,
    InteractorSpec, ReplaySettings, TrackingEngine,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::EngineContext;
use crate::error::{ReplayError, Result};

/// Shortest time one pass of a looping replay may take
const MIN_LOOP_PERIOD: Duration = Duration::from_millis(10);

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Replay speed multiplier (1.0 = original speed)
    pub speed_multiplier: f64,

    /// Restart from the first event when finished
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            loop_playback: false,
        }
    }
}

impl From<&ReplaySettings> for ReplayConfig {
    fn from(settings: &ReplaySettings) -> Self {
        Self {
            speed_multiplier: settings.speed_multiplier,
            loop_playback: settings.loop_playback,
        }
    }
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Delivery time (ms)
    pub at_ms: f64,

    #[serde(flatten)]
    pub event: EngineEvent,
}

impl RecordedEvent {
    pub fn new(at_ms: f64, event: EngineEvent) -> Self {
        Self { at_ms, event }
    }
}

/// Replay engine
pub struct ReplayTrackingEngine {
    context: Arc<EngineContext>,
    events: Arc<Vec<RecordedEvent>>,
    config: ReplayConfig,
    finished: Arc<AtomicBool>,
    source: Option<PathBuf>,
}

impl fmt::Debug for ReplayTrackingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayTrackingEngine")
            .field("events", &self.events.len())
            .field("config", &self.config)
            .field("finished", &self.is_finished())
            .field("source", &self.source)
            .finish()
    }
}

/// Delivery offsets of one replay pass, scaled by the speed multiplier
#[derive(Debug)]
struct Schedule {
    offsets: Vec<Duration>,
    /// Time between the starts of two passes; `None` plays once
    period: Option<Duration>,
}

impl Schedule {
    fn new(
        events: &[RecordedEvent],
        config: &ReplayConfig,
    ) -> std::result::Result<Self, ContractError> {
        let speed = config.speed_multiplier;
        if !(speed > 0.0 && speed.is_finite()) {
            return Err(ContractError::engine(
                EngineStep::EnableConnection,
                format!("replay speed multiplier must be finite and > 0, got {speed}"),
            ));
        }

        let first_at = events.first().map_or(0.0, |e| e.at_ms);
        let offsets = events
            .iter()
            .map(|e| scale_ms(e.at_ms - first_at, speed))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                ContractError::engine(
                    EngineStep::EnableConnection,
                    format!("replay timeline is out of range at speed {speed}"),
                )
            })?;

        if !config.loop_playback {
            return Ok(Self {
                offsets,
                period: None,
            });
        }

        let span = offsets.iter().max().copied().unwrap_or_default();
        if span.is_zero() {
            return Err(ContractError::engine(
                EngineStep::EnableConnection,
                "looping replay needs events spread over time",
            ));
        }
        // span > 0 implies at least two events
        let gap = span.div_f64((offsets.len() - 1) as f64);
        let period = span
            .checked_add(gap)
            .ok_or_else(|| {
                ContractError::engine(
                    EngineStep::EnableConnection,
                    "replay loop period is out of range",
                )
            })?
            .max(MIN_LOOP_PERIOD);

        Ok(Self {
            offsets,
            period: Some(period),
        })
    }
}

/// `ms / speed` as a `Duration`, `None` when it does not fit
fn scale_ms(ms: f64, speed: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(ms.max(0.0) / 1000.0 / speed).ok()
}

impl ReplayTrackingEngine {
    /// Load a JSON-lines recording
    pub fn load(path: &Path, config: ReplayConfig) -> Result<Self> {
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ReplayError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let event: RecordedEvent =
                serde_json::from_str(&line).map_err(|source| ReplayError::Parse {
                    line: index + 1,
                    source,
                })?;
            events.push(event);
        }

        info!(path = %path.display(), events = events.len(), "Loaded replay recording");

        let mut engine = Self::from_events(events, config);
        engine.source = Some(path.to_path_buf());
        Ok(engine)
    }

    /// Replay an in-memory list of events
    pub fn from_events(mut events: Vec<RecordedEvent>, config: ReplayConfig) -> Self {
        events.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        Self {
            context: Arc::new(EngineContext::new("replay", None)),
            events: Arc::new(events),
            config,
            finished: Arc::new(AtomicBool::new(false)),
            source: None,
        }
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Recording the events were loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether a non-looping playback has delivered every event
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl TrackingEngine for ReplayTrackingEngine {
    fn name(&self) -> &str {
        self.context.name()
    }

    fn initialize(&self) -> std::result::Result<(), ContractError> {
        self.context.initialize()
    }

    fn register_global_interactor(
        &self,
        spec: &InteractorSpec,
    ) -> std::result::Result<(), ContractError> {
        self.context.register_interactor(spec)
    }

    fn register_connection_state_handler(
        &self,
        callback: ConnectionStateCallback,
    ) -> std::result::Result<(), ContractError> {
        self.context.register_state_handler(callback)
    }

    fn register_event_handler(
        &self,
        callback: EngineEventCallback,
    ) -> std::result::Result<(), ContractError> {
        self.context.register_event_handler(callback)
    }

    fn enable_connection(&self) -> std::result::Result<(), ContractError> {
        let schedule = Schedule::new(&self.events, &self.config)?;
        let events = Arc::clone(&self.events);
        let finished = Arc::clone(&self.finished);

        self.context.enable(move |context| {
            if !context.wait_for_commit() {
                return;
            }

            if events.is_empty() {
                warn!("No events to replay");
                finished.store(true, Ordering::SeqCst);
                return;
            }

            loop {
                let pass_start = Instant::now();

                for (recorded, offset) in events.iter().zip(&schedule.offsets) {
                    let elapsed = pass_start.elapsed();
                    if *offset > elapsed && !context.sleep_while_running(*offset - elapsed) {
                        debug!("Replay stopped");
                        return;
                    }
                    if !context.is_running() {
                        return;
                    }
                    context.emit(recorded.event.clone());
                }

                let Some(period) = schedule.period else {
                    info!(events = events.len(), "Replay completed");
                    finished.store(true, Ordering::SeqCst);
                    return;
                };

                let elapsed = pass_start.elapsed();
                if period > elapsed && !context.sleep_while_running(period - elapsed) {
                    debug!("Replay stopped");
                    return;
                }
                debug!("Looping replay");
            }
        })
    }

    fn commit_subscription(&self) -> std::result::Result<(), ContractError> {
        self.context.commit()
    }

    fn disable_connection(&self) {
        self.context.disable();
    }

    fn shutdown(&self) {
        self.context.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BehaviorPayload, BehaviorType};
    use std::io::Write;
    use std::sync::Mutex;
    use std::thread;

    fn gaze_event(at_ms: f64, timestamp: f64) -> RecordedEvent {
        RecordedEvent::new(
            at_ms,
            EngineEvent::new(
                "",
                vec![BehaviorPayload::new(BehaviorType::GazePoint)
                    .with("timestamp", timestamp)
                    .with("x", 1.0)
                    .with("y", 2.0)],
            ),
        )
    }

    fn start(engine: &ReplayTrackingEngine, sink: Arc<Mutex<Vec<EngineEvent>>>) {
        engine.initialize().unwrap();
        engine
            .register_global_interactor(&InteractorSpec::all_behaviors("eyestream"))
            .unwrap();
        engine
            .register_event_handler(Arc::new(move |event| sink.lock().unwrap().push(event)))
            .unwrap();
        engine.enable_connection().unwrap();

        // Connected is reported by the connection thread
        for _ in 0..100 {
            if engine.commit_subscription().is_ok() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("engine never connected");
    }

    fn wait_finished(engine: &ReplayTrackingEngine) {
        for _ in 0..200 {
            if engine.is_finished() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("replay never finished");
    }

    #[test]
    fn test_load_jsonl() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"at_ms": 20.0, "behaviors": [{{"behavior_type": "gaze_point", "params": {{"timestamp": 2.0, "x": 1.0, "y": 1.0}}}}]}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"at_ms": 0.0, "interactor_id": "eyestream", "behaviors": []}}"#
        )
        .unwrap();

        let engine = ReplayTrackingEngine::load(file.path(), ReplayConfig::default()).unwrap();
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.events[0].at_ms, 0.0);
        assert_eq!(engine.events[1].event.behaviors.len(), 1);
        assert_eq!(engine.source(), Some(file.path()));
    }

    #[test]
    fn test_load_reports_bad_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"at_ms": 0.0, "behaviors": []}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        let err = ReplayTrackingEngine::load(file.path(), ReplayConfig::default()).unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ReplayTrackingEngine::load(Path::new("/nonexistent/replay.jsonl"), ReplayConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReplayError::Io { .. }));
    }

    #[test]
    fn test_replay_delivers_in_order_and_finishes() {
        let engine = ReplayTrackingEngine::from_events(
            vec![gaze_event(10.0, 2.0), gaze_event(0.0, 1.0), gaze_event(20.0, 3.0)],
            ReplayConfig {
                speed_multiplier: 10.0,
                loop_playback: false,
            },
        );
        let received = Arc::new(Mutex::new(Vec::new()));

        start(&engine, Arc::clone(&received));
        wait_finished(&engine);
        engine.shutdown();

        let received = received.lock().unwrap();
        let timestamps: Vec<f64> = received
            .iter()
            .map(|e| e.behaviors[0].param("timestamp").unwrap().as_f64().unwrap())
            .collect();
        assert_eq!(timestamps, vec![1.0, 2.0, 3.0]);
        assert!(received.iter().all(|e| e.interactor_id == "eyestream"));
    }

    #[test]
    fn test_unsubscribed_behaviors_filtered() {
        let engine = ReplayTrackingEngine::from_events(
            vec![gaze_event(0.0, 1.0)],
            ReplayConfig::default(),
        );
        let received = Arc::new(Mutex::new(Vec::new()));

        engine.initialize().unwrap();
        let spec = InteractorSpec {
            behaviors: vec![BehaviorType::Fixation],
            ..InteractorSpec::all_behaviors("eyestream")
        };
        engine.register_global_interactor(&spec).unwrap();
        let sink = Arc::clone(&received);
        engine
            .register_event_handler(Arc::new(move |event| sink.lock().unwrap().push(event)))
            .unwrap();
        engine.enable_connection().unwrap();
        for _ in 0..100 {
            if engine.commit_subscription().is_ok() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        wait_finished(&engine);
        engine.shutdown();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].behaviors.is_empty());
    }

    #[test]
    fn test_stop_while_looping() {
        let engine = ReplayTrackingEngine::from_events(
            vec![gaze_event(0.0, 1.0), gaze_event(5.0, 2.0)],
            ReplayConfig {
                speed_multiplier: 1.0,
                loop_playback: true,
            },
        );
        let received = Arc::new(Mutex::new(Vec::new()));

        start(&engine, Arc::clone(&received));
        thread::sleep(Duration::from_millis(50));
        engine.disable_connection();

        assert!(!engine.is_finished());
        let count = received.lock().unwrap().len();
        assert!(count > 2);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(received.lock().unwrap().len(), count);
    }

    #[test]
    fn test_looping_replay_delivery_rate_is_bounded() {
        // Both events inside one millisecond: the loop period floor applies
        let engine = ReplayTrackingEngine::from_events(
            vec![gaze_event(0.0, 1.0), gaze_event(0.001, 2.0)],
            ReplayConfig {
                speed_multiplier: 1.0,
                loop_playback: true,
            },
        );
        let received = Arc::new(Mutex::new(Vec::new()));

        start(&engine, Arc::clone(&received));
        thread::sleep(Duration::from_millis(100));
        engine.shutdown();

        // 100 ms at one pass per 10 ms, two events per pass, plus slack
        let count = received.lock().unwrap().len();
        assert!(count >= 2, "only {count} events delivered");
        assert!(count <= 40, "{count} events delivered in 100 ms");
    }

    #[test]
    fn test_looping_zero_span_recording_rejected() {
        for events in [
            vec![gaze_event(0.0, 1.0)],
            vec![gaze_event(5.0, 1.0), gaze_event(5.0, 2.0)],
        ] {
            let engine = ReplayTrackingEngine::from_events(
                events,
                ReplayConfig {
                    speed_multiplier: 1.0,
                    loop_playback: true,
                },
            );
            engine.initialize().unwrap();
            let err = engine.enable_connection().unwrap_err();
            assert!(err.to_string().contains("spread over time"));
            engine.shutdown();
        }
    }

    #[test]
    fn test_out_of_range_timeline_rejected() {
        let tiny_speed = ReplayTrackingEngine::from_events(
            vec![gaze_event(0.0, 1.0), gaze_event(1000.0, 2.0)],
            ReplayConfig {
                speed_multiplier: 1e-300,
                loop_playback: false,
            },
        );
        tiny_speed.initialize().unwrap();
        assert!(tiny_speed.enable_connection().is_err());

        let huge_offset = ReplayTrackingEngine::from_events(
            vec![gaze_event(0.0, 1.0), gaze_event(1e300, 2.0)],
            ReplayConfig::default(),
        );
        huge_offset.initialize().unwrap();
        assert!(huge_offset.enable_connection().is_err());
    }

    #[test]
    fn test_schedule_scales_offsets() {
        let events = vec![gaze_event(100.0, 1.0), gaze_event(300.0, 2.0), gaze_event(500.0, 3.0)];
        let schedule = Schedule::new(
            &events,
            &ReplayConfig {
                speed_multiplier: 2.0,
                loop_playback: true,
            },
        )
        .unwrap();

        let ms = |d: Duration| (d.as_secs_f64() * 1000.0).round() as u64;
        let offsets: Vec<u64> = schedule.offsets.iter().copied().map(ms).collect();
        assert_eq!(offsets, vec![0, 100, 200]);
        assert_eq!(schedule.period.map(ms), Some(300));
    }

    #[test]
    fn test_debug_summarizes_engine() {
        let engine =
            ReplayTrackingEngine::from_events(vec![gaze_event(0.0, 1.0)], ReplayConfig::default());
        let debug = format!("{engine:?}");
        assert!(debug.contains("events: 1"));
        assert!(debug.contains("finished: false"));
    }
}
