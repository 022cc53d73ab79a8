//! Synthetic tracking engine
//!
//! Generates plausible eye movements on a background thread: gaze points
//! jittering around a fixation center, a Begin/Data/End fixation lifecycle
//! per center, and both eyes' positions about 60 cm from the sensor.
//! Used for development and tests without tracking hardware.

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    BehaviorPayload, BehaviorType, ConnectionStateCallback, ContractError, EngineEvent,
    EngineEventCallback, EngineStep, FixationSubtype, InteractorSpec, MockEngineSettings,
    TrackingEngine,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::context::EngineContext;

/// Synthetic engine
pub struct MockTrackingEngine {
    context: Arc<EngineContext>,
    settings: MockEngineSettings,
    seed: Option<u64>,
}

impl MockTrackingEngine {
    /// Create a synthetic engine
    pub fn new(settings: MockEngineSettings) -> Self {
        Self {
            context: Arc::new(EngineContext::new("mock", None)),
            settings,
            seed: None,
        }
    }

    /// Create a synthetic engine whose `step` always fails
    pub fn failing_on(settings: MockEngineSettings, step: EngineStep) -> Self {
        Self {
            context: Arc::new(EngineContext::new("mock", Some(step))),
            settings,
            seed: None,
        }
    }

    /// Use a fixed RNG seed for reproducible output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl std::fmt::Debug for MockTrackingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTrackingEngine")
            .field("settings", &self.settings)
            .field("seed", &self.seed)
            .finish()
    }
}

impl Default for MockTrackingEngine {
    fn default() -> Self {
        Self::new(MockEngineSettings::default())
    }
}

impl TrackingEngine for MockTrackingEngine {
    fn name(&self) -> &str {
        self.context.name()
    }

    fn initialize(&self) -> Result<(), ContractError> {
        self.context.initialize()
    }

    fn register_global_interactor(&self, spec: &InteractorSpec) -> Result<(), ContractError> {
        self.context.register_interactor(spec)
    }

    fn register_connection_state_handler(
        &self,
        callback: ConnectionStateCallback,
    ) -> Result<(), ContractError> {
        self.context.register_state_handler(callback)
    }

    fn register_event_handler(&self, callback: EngineEventCallback) -> Result<(), ContractError> {
        self.context.register_event_handler(callback)
    }

    fn enable_connection(&self) -> Result<(), ContractError> {
        let settings = self.settings.clone();
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        self.context.enable(move |context| {
            let interval = Duration::from_secs_f64(1.0 / settings.frequency_hz.max(0.1));
            let mut simulator = GazeSimulator::new(&settings, rng);

            if !context.wait_for_commit() {
                return;
            }
            debug!(frequency_hz = settings.frequency_hz, "Mock engine streaming");

            loop {
                let behaviors = simulator.step(context.now_ms());
                context.emit(EngineEvent::new("", behaviors));
                if !context.sleep_while_running(interval) {
                    break;
                }
            }
        })
    }

    fn commit_subscription(&self) -> Result<(), ContractError> {
        self.context.commit()
    }

    fn disable_connection(&self) {
        self.context.disable();
    }

    fn shutdown(&self) {
        self.context.shutdown();
    }
}

/// Sample-by-sample eye movement model
struct GazeSimulator {
    rng: StdRng,
    width: f64,
    height: f64,
    center: (f64, f64),
    /// Samples left in the current fixation, including this one
    remaining: u32,
    in_fixation: bool,
}

impl GazeSimulator {
    fn new(settings: &MockEngineSettings, rng: StdRng) -> Self {
        Self {
            rng,
            width: settings.screen_width.max(1.0),
            height: settings.screen_height.max(1.0),
            center: (0.0, 0.0),
            remaining: 0,
            in_fixation: false,
        }
    }

    fn step(&mut self, timestamp: f64) -> Vec<BehaviorPayload> {
        let subtype = if !self.in_fixation {
            self.center = (
                self.rng.random_range(0.0..self.width),
                self.rng.random_range(0.0..self.height),
            );
            self.remaining = self.rng.random_range(8..40);
            self.in_fixation = true;
            FixationSubtype::Begin
        } else if self.remaining <= 1 {
            self.in_fixation = false;
            FixationSubtype::End
        } else {
            FixationSubtype::Data
        };
        self.remaining = self.remaining.saturating_sub(1);

        let (cx, cy) = self.center;
        let gaze_x = (cx + self.rng.random_range(-15.0..15.0)).clamp(0.0, self.width);
        let gaze_y = (cy + self.rng.random_range(-15.0..15.0)).clamp(0.0, self.height);

        vec![
            BehaviorPayload::new(BehaviorType::Fixation)
                .with("timestamp", timestamp)
                .with("event_type", subtype.label().to_ascii_lowercase())
                .with("x", cx)
                .with("y", cy),
            BehaviorPayload::new(BehaviorType::GazePoint)
                .with("timestamp", timestamp)
                .with("x", gaze_x)
                .with("y", gaze_y),
            self.eye_position(timestamp),
        ]
    }

    fn eye_position(&mut self, timestamp: f64) -> BehaviorPayload {
        let head_x = self.rng.random_range(-2.0..2.0);
        let head_y = self.rng.random_range(-2.0..2.0);
        let head_z = 600.0 + self.rng.random_range(-5.0..5.0);

        BehaviorPayload::new(BehaviorType::EyePosition)
            .with("timestamp", timestamp)
            .with("left_x", head_x - 31.0)
            .with("left_y", head_y)
            .with("left_z", head_z)
            .with("right_x", head_x + 31.0)
            .with("right_y", head_y)
            .with("right_z", head_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ConnectionState;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::thread;

    fn subtype_of(payloads: &[BehaviorPayload]) -> String {
        payloads[0]
            .param("event_type")
            .and_then(|v| v.as_str())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_simulator_fixation_lifecycle() {
        let mut simulator =
            GazeSimulator::new(&MockEngineSettings::default(), StdRng::seed_from_u64(7));

        let subtypes: Vec<String> = (0..200)
            .map(|i| subtype_of(&simulator.step(i as f64)))
            .collect();

        assert_eq!(subtypes[0], "begin");
        for pair in subtypes.windows(2) {
            match pair[0].as_str() {
                "begin" | "data" => assert!(pair[1] == "data" || pair[1] == "end"),
                "end" => assert_eq!(pair[1], "begin"),
                other => panic!("unexpected subtype {other}"),
            }
        }
        assert!(subtypes.iter().any(|s| s == "end"));
    }

    #[test]
    fn test_simulator_stays_on_screen() {
        let settings = MockEngineSettings {
            screen_width: 100.0,
            screen_height: 50.0,
            ..Default::default()
        };
        let mut simulator = GazeSimulator::new(&settings, StdRng::seed_from_u64(1));

        for i in 0..100 {
            let payloads = simulator.step(i as f64);
            let x = payloads[1].param("x").and_then(|v| v.as_f64()).unwrap();
            let y = payloads[1].param("y").and_then(|v| v.as_f64()).unwrap();
            assert!((0.0..=100.0).contains(&x));
            assert!((0.0..=50.0).contains(&y));
        }
    }

    #[test]
    fn test_engine_lifecycle_delivers_events_after_commit() {
        let engine = MockTrackingEngine::new(MockEngineSettings {
            frequency_hz: 200.0,
            ..Default::default()
        })
        .with_seed(3);

        let states = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(AtomicU64::new(0));

        engine.initialize().unwrap();
        engine
            .register_global_interactor(&InteractorSpec::all_behaviors("eyestream"))
            .unwrap();
        let states_clone = Arc::clone(&states);
        engine
            .register_connection_state_handler(Arc::new(move |state| {
                states_clone.lock().unwrap().push(state);
            }))
            .unwrap();
        let events_clone = Arc::clone(&events);
        engine
            .register_event_handler(Arc::new(move |event| {
                assert_eq!(event.interactor_id, "eyestream");
                assert_eq!(event.behaviors.len(), 3);
                events_clone.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
        engine.enable_connection().unwrap();

        // Nothing is delivered before the subscription is committed
        thread::sleep(Duration::from_millis(50));
        assert_eq!(events.load(Ordering::Relaxed), 0);
        assert_eq!(
            states.lock().unwrap().as_slice(),
            &[ConnectionState::TryingToConnect, ConnectionState::Connected]
        );

        engine.commit_subscription().unwrap();
        thread::sleep(Duration::from_millis(100));
        engine.disable_connection();
        engine.shutdown();

        assert!(events.load(Ordering::Relaxed) > 0);
        assert_eq!(
            states.lock().unwrap().last(),
            Some(&ConnectionState::Disconnected)
        );
    }

    #[test]
    fn test_setup_before_initialize_fails() {
        let engine = MockTrackingEngine::default();
        let err = engine
            .register_global_interactor(&InteractorSpec::all_behaviors("eyestream"))
            .unwrap_err();
        assert!(matches!(
            err,
            ContractError::Engine {
                step: EngineStep::RegisterInteractor,
                ..
            }
        ));
        assert!(engine.commit_subscription().is_err());
    }

    #[test]
    fn test_simulated_step_failure() {
        let engine =
            MockTrackingEngine::failing_on(MockEngineSettings::default(), EngineStep::EnableConnection);
        engine.initialize().unwrap();
        let err = engine.enable_connection().unwrap_err();
        assert!(err.to_string().contains("enable_connection"));
        engine.shutdown();
    }
}
