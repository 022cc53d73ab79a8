//! StreamerConfig - Config Loader output
//!
//! Describes the tunable parts of a streaming session: outbound queue,
//! tracking engine source and observability. Every section has defaults so an
//! empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{FixationDataMode, GazePointDataMode, InteractorSpec};

/// Complete streamer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Outbound stream settings
    #[serde(default)]
    pub stream: StreamSettings,

    /// Tracking engine settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Observability settings
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// Outbound stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Delay between transport setup and engine setup (ms)
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Capacity of the queue between event adapter and stream writer
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl StreamSettings {
    /// Startup delay as a `Duration`
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_startup_delay_ms() -> u64 {
    2000
}

fn default_queue_capacity() -> usize {
    256
}

/// Which notification source drives the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineSource {
    /// Synthetic engine generating plausible eye movements
    #[default]
    Mock,
    /// Replay of recorded engine events
    Replay,
}

/// Tracking engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Notification source
    #[serde(default)]
    pub source: EngineSource,

    /// Global interactor ID
    #[serde(default = "default_interactor_id")]
    pub interactor_id: String,

    /// Fixation detection mode
    #[serde(default)]
    pub fixation_mode: FixationDataMode,

    /// Gaze point filtering mode
    #[serde(default)]
    pub gaze_point_mode: GazePointDataMode,

    /// Synthetic engine parameters
    #[serde(default)]
    pub mock: MockEngineSettings,

    /// Replay parameters
    #[serde(default)]
    pub replay: ReplaySettings,
}

impl EngineSettings {
    /// Build the interactor subscription for these settings
    pub fn interactor_spec(&self) -> InteractorSpec {
        InteractorSpec {
            id: self.interactor_id.clone(),
            fixation_mode: self.fixation_mode,
            gaze_point_mode: self.gaze_point_mode,
            behaviors: crate::BehaviorType::ALL.to_vec(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            source: EngineSource::default(),
            interactor_id: default_interactor_id(),
            fixation_mode: FixationDataMode::default(),
            gaze_point_mode: GazePointDataMode::default(),
            mock: MockEngineSettings::default(),
            replay: ReplaySettings::default(),
        }
    }
}

fn default_interactor_id() -> String {
    "eyestream".to_string()
}

/// Synthetic engine parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockEngineSettings {
    /// Notification rate (Hz), must be > 0
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,

    /// Simulated screen width (px)
    #[serde(default = "default_screen_width")]
    pub screen_width: f64,

    /// Simulated screen height (px)
    #[serde(default = "default_screen_height")]
    pub screen_height: f64,
}

impl Default for MockEngineSettings {
    fn default() -> Self {
        Self {
            frequency_hz: default_frequency_hz(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
        }
    }
}

fn default_frequency_hz() -> f64 {
    60.0
}

fn default_screen_width() -> f64 {
    1920.0
}

fn default_screen_height() -> f64 {
    1080.0
}

/// Replay parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySettings {
    /// JSON-lines recording, required when `source = "replay"`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = original speed)
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,

    /// Restart from the first event when finished
    #[serde(default)]
    pub loop_playback: bool,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            path: None,
            speed_multiplier: default_speed_multiplier(),
            loop_playback: false,
        }
    }
}

fn default_speed_multiplier() -> f64 {
    1.0
}

/// Observability settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}
