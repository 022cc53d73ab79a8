//! TrackingEngine trait - eye-tracking engine abstraction
//!
//! Defines the interface to the external engine that owns the hardware
//! connection. Notifications are delivered through callbacks on
//! engine-owned threads, the same way the vendor SDK delivers them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ContractError;

/// Engine connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    TryingToConnect,
    ServerVersionTooLow,
    ServerVersionTooHigh,
}

impl ConnectionState {
    /// Human-readable explanation of the state
    pub fn describe(self) -> &'static str {
        match self {
            Self::Connected => "connected to the tracking engine",
            Self::Disconnected => "disconnected from the tracking engine",
            Self::TryingToConnect => "trying to connect to the tracking engine",
            Self::ServerVersionTooLow => {
                "this application requires a more recent version of the tracking engine"
            }
            Self::ServerVersionTooHigh => {
                "this application requires an older version of the tracking engine"
            }
        }
    }

    /// Numeric value for gauges
    pub fn as_gauge(self) -> f64 {
        match self {
            Self::Disconnected => 0.0,
            Self::TryingToConnect => 1.0,
            Self::Connected => 2.0,
            Self::ServerVersionTooLow => -1.0,
            Self::ServerVersionTooHigh => -2.0,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "CONNECTED",
            Self::Disconnected => "DISCONNECTED",
            Self::TryingToConnect => "TRYING_TO_CONNECT",
            Self::ServerVersionTooLow => "SERVER_VERSION_TOO_LOW",
            Self::ServerVersionTooHigh => "SERVER_VERSION_TOO_HIGH",
        };
        f.write_str(name)
    }
}

/// Behavior category an interactor can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorType {
    Fixation,
    GazePoint,
    EyePosition,
}

impl BehaviorType {
    /// All behaviors the streamer subscribes to
    pub const ALL: [BehaviorType; 3] = [Self::Fixation, Self::GazePoint, Self::EyePosition];

    /// Stable lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixation => "fixation",
            Self::GazePoint => "gaze_point",
            Self::EyePosition => "eye_position",
        }
    }
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixation detection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixationDataMode {
    #[default]
    Sensitive,
    Slow,
}

/// Gaze point filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazePointDataMode {
    #[default]
    LightlyFiltered,
    Unfiltered,
}

/// Global interactor subscription request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractorSpec {
    /// Interactor ID, unique within the application
    pub id: String,

    /// Fixation behavior parameters
    pub fixation_mode: FixationDataMode,

    /// Gaze point behavior parameters
    pub gaze_point_mode: GazePointDataMode,

    /// Requested behaviors
    pub behaviors: Vec<BehaviorType>,
}

impl InteractorSpec {
    /// Subscribe to every behavior with default modes
    pub fn all_behaviors(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fixation_mode: FixationDataMode::default(),
            gaze_point_mode: GazePointDataMode::default(),
            behaviors: BehaviorType::ALL.to_vec(),
        }
    }
}

/// Setup and lifecycle steps, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStep {
    Initialize,
    RegisterInteractor,
    RegisterConnectionHandler,
    RegisterEventHandler,
    EnableConnection,
    CommitSubscription,
}

impl fmt::Display for EngineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialize => "initialize",
            Self::RegisterInteractor => "register_interactor",
            Self::RegisterConnectionHandler => "register_connection_handler",
            Self::RegisterEventHandler => "register_event_handler",
            Self::EnableConnection => "enable_connection",
            Self::CommitSubscription => "commit_subscription",
        };
        f.write_str(name)
    }
}

/// Raw behavior payload as delivered by the engine
///
/// Parameters are loosely typed; the event adapter extracts and validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorPayload {
    /// Behavior category
    pub behavior_type: BehaviorType,

    /// Named event parameters
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl BehaviorPayload {
    /// Create an empty payload
    pub fn new(behavior_type: BehaviorType) -> Self {
        Self {
            behavior_type,
            params: Map::new(),
        }
    }

    /// Builder-style parameter insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Look up a parameter
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// One engine notification, carrying zero or more behavior payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Interactor the event was routed to
    #[serde(default)]
    pub interactor_id: String,

    /// Behavior payloads present in this notification
    #[serde(default)]
    pub behaviors: Vec<BehaviorPayload>,
}

impl EngineEvent {
    /// Create an event for the given interactor
    pub fn new(interactor_id: impl Into<String>, behaviors: Vec<BehaviorPayload>) -> Self {
        Self {
            interactor_id: interactor_id.into(),
            behaviors,
        }
    }

    /// Query the first payload of one behavior kind
    pub fn behavior(&self, behavior_type: BehaviorType) -> Option<&BehaviorPayload> {
        self.behaviors_of(behavior_type).next()
    }

    /// Every payload of one behavior kind, in delivery order
    pub fn behaviors_of(
        &self,
        behavior_type: BehaviorType,
    ) -> impl Iterator<Item = &BehaviorPayload> + '_ {
        self.behaviors
            .iter()
            .filter(move |b| b.behavior_type == behavior_type)
    }
}

/// Connection state callback type
pub type ConnectionStateCallback = Arc<dyn Fn(ConnectionState) + Send + Sync>;

/// Event notification callback type
pub type EngineEventCallback = Arc<dyn Fn(EngineEvent) + Send + Sync>;

/// Tracking engine trait
///
/// Abstracts the engine context lifecycle. Setup calls return `Result` so the
/// caller can log a failing step and carry on; teardown calls are infallible
/// and idempotent.
///
/// # Example
///
/// ```ignore
/// engine.initialize()?;
/// engine.register_global_interactor(&InteractorSpec::all_behaviors("eyestream"))?;
/// engine.register_event_handler(Arc::new(|event| println!("{event:?}")))?;
/// engine.enable_connection()?;
/// // ... on ConnectionState::Connected:
/// engine.commit_subscription()?;
/// ```
pub trait TrackingEngine: Send + Sync {
    /// Engine name (used for logging)
    fn name(&self) -> &str;

    /// Initialize the engine context
    fn initialize(&self) -> Result<(), ContractError>;

    /// Create the global interactor with the requested behaviors
    fn register_global_interactor(&self, spec: &InteractorSpec) -> Result<(), ContractError>;

    /// Register the connection state handler
    fn register_connection_state_handler(
        &self,
        callback: ConnectionStateCallback,
    ) -> Result<(), ContractError>;

    /// Register the event notification handler
    fn register_event_handler(&self, callback: EngineEventCallback) -> Result<(), ContractError>;

    /// Start connecting to the engine; state changes arrive on the handler
    fn enable_connection(&self) -> Result<(), ContractError>;

    /// Send the interactor subscription; only valid once connected
    fn commit_subscription(&self) -> Result<(), ContractError>;

    /// Stop the connection and event delivery
    fn disable_connection(&self);

    /// Release handlers and the engine context
    fn shutdown(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_behavior_query() {
        let event = EngineEvent::new(
            "test",
            vec![
                BehaviorPayload::new(BehaviorType::GazePoint).with("x", 1.0),
                BehaviorPayload::new(BehaviorType::EyePosition),
            ],
        );

        assert!(event.behavior(BehaviorType::GazePoint).is_some());
        assert!(event.behavior(BehaviorType::EyePosition).is_some());
        assert!(event.behavior(BehaviorType::Fixation).is_none());
        assert_eq!(
            event
                .behavior(BehaviorType::GazePoint)
                .and_then(|b| b.param("x"))
                .and_then(|v| v.as_f64()),
            Some(1.0)
        );
    }

    #[test]
    fn test_event_behaviors_of_keeps_duplicates() {
        let event = EngineEvent::new(
            "test",
            vec![
                BehaviorPayload::new(BehaviorType::GazePoint).with("x", 1.0),
                BehaviorPayload::new(BehaviorType::Fixation),
                BehaviorPayload::new(BehaviorType::GazePoint).with("x", 2.0),
            ],
        );

        let xs: Vec<f64> = event
            .behaviors_of(BehaviorType::GazePoint)
            .filter_map(|b| b.param("x").and_then(|v| v.as_f64()))
            .collect();
        assert_eq!(xs, vec![1.0, 2.0]);
        assert_eq!(event.behaviors_of(BehaviorType::EyePosition).count(), 0);
    }

    #[test]
    fn test_event_deserialize() {
        let json = r#"{
            "behaviors": [
                { "behavior_type": "fixation",
                  "params": { "timestamp": 1000.0, "event_type": "begin", "x": 0.5, "y": 0.5 } }
            ]
        }"#;
        let event: EngineEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.interactor_id, "");
        assert_eq!(event.behaviors.len(), 1);
        assert_eq!(event.behaviors[0].behavior_type, BehaviorType::Fixation);
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "CONNECTED");
        assert_eq!(
            ConnectionState::ServerVersionTooLow.to_string(),
            "SERVER_VERSION_TOO_LOW"
        );
        assert!(ConnectionState::ServerVersionTooHigh
            .describe()
            .contains("older version"));
    }

    #[test]
    fn test_interactor_spec_all_behaviors() {
        let spec = InteractorSpec::all_behaviors("eyestream");
        assert_eq!(spec.behaviors.len(), 3);
        assert_eq!(spec.fixation_mode, FixationDataMode::Sensitive);
        assert_eq!(spec.gaze_point_mode, GazePointDataMode::LightlyFiltered);
    }
}
