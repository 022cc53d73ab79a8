//! MeasurementRecord - Event Adapter output
//!
//! The unit of data crossing the wire. Records are immutable values created
//! per engine event, consumed by the encoder, and discarded after sending.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavior type code carried on the wire for fixation records
pub const FIXATION_BEHAVIOR_CODE: f32 = 7.0;

/// Behavior type code carried on the wire for gaze point records
pub const GAZE_POINT_BEHAVIOR_CODE: f32 = 1.0;

/// Behavior type code carried on the wire for eye position records
pub const EYE_POSITION_BEHAVIOR_CODE: f32 = 3.0;

/// Single-field sentinel sent once at shutdown
pub const TERMINATE_SENTINEL: f32 = -1.0;

/// Record discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Fixation,
    GazePoint,
    EyePosition,
    Terminate,
}

impl RecordKind {
    /// Behavior type code, `None` for the terminate sentinel
    pub fn behavior_code(self) -> Option<f32> {
        match self {
            Self::Fixation => Some(FIXATION_BEHAVIOR_CODE),
            Self::GazePoint => Some(GAZE_POINT_BEHAVIOR_CODE),
            Self::EyePosition => Some(EYE_POSITION_BEHAVIOR_CODE),
            Self::Terminate => None,
        }
    }

    /// Reverse lookup from a behavior type code
    pub fn from_behavior_code(code: f32) -> Option<Self> {
        if code == FIXATION_BEHAVIOR_CODE {
            Some(Self::Fixation)
        } else if code == GAZE_POINT_BEHAVIOR_CODE {
            Some(Self::GazePoint)
        } else if code == EYE_POSITION_BEHAVIOR_CODE {
            Some(Self::EyePosition)
        } else {
            None
        }
    }

    /// Number of `f32` fields following the byte count (timestamp and code included)
    pub fn field_count(self) -> usize {
        match self {
            Self::Fixation => 5,
            Self::GazePoint => 4,
            Self::EyePosition => 8,
            Self::Terminate => 0,
        }
    }

    /// Stable lowercase name for logs and metric labels
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixation => "fixation",
            Self::GazePoint => "gaze_point",
            Self::EyePosition => "eye_position",
            Self::Terminate => "terminate",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixation event subtype
///
/// The wire codes do not follow the natural Begin -> Data -> End order:
/// receivers depend on these literal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixationSubtype {
    Begin,
    Data,
    End,
}

impl FixationSubtype {
    /// Wire code: Begin=1, End=2, Data=3
    pub fn code(self) -> f32 {
        match self {
            Self::Begin => 1.0,
            Self::End => 2.0,
            Self::Data => 3.0,
        }
    }

    /// Reverse lookup from a wire code
    pub fn from_code(code: f32) -> Option<Self> {
        if code == 1.0 {
            Some(Self::Begin)
        } else if code == 2.0 {
            Some(Self::End)
        } else if code == 3.0 {
            Some(Self::Data)
        } else {
            None
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Begin => "Begin",
            Self::Data => "Data",
            Self::End => "End",
        }
    }
}

impl fmt::Display for FixationSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 3D eye coordinates relative to the tracking sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Measurement record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeasurementRecord {
    /// Fixation lifecycle sample in screen coordinates
    Fixation {
        timestamp_ms: f32,
        subtype: FixationSubtype,
        x: f32,
        y: f32,
    },

    /// Instantaneous on-screen gaze estimate
    GazePoint { timestamp_ms: f32, x: f32, y: f32 },

    /// Binocular 3D eye position
    EyePosition {
        timestamp_ms: f32,
        left: Point3,
        right: Point3,
    },

    /// Shutdown sentinel, no payload
    Terminate,
}

impl MeasurementRecord {
    /// Record discriminant
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Fixation { .. } => RecordKind::Fixation,
            Self::GazePoint { .. } => RecordKind::GazePoint,
            Self::EyePosition { .. } => RecordKind::EyePosition,
            Self::Terminate => RecordKind::Terminate,
        }
    }

    /// Timestamp in milliseconds since boot, `None` for terminate
    pub fn timestamp_ms(&self) -> Option<f32> {
        match self {
            Self::Fixation { timestamp_ms, .. }
            | Self::GazePoint { timestamp_ms, .. }
            | Self::EyePosition { timestamp_ms, .. } => Some(*timestamp_ms),
            Self::Terminate => None,
        }
    }
}
