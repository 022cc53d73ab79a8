//! Typed views over loosely-typed behavior payloads
//!
//! Parameter names follow the engine's event parameter structs:
//!
//! | Behavior | Keys |
//! |---|---|
//! | fixation | `timestamp`, `event_type` (`begin`/`data`/`end`), `x`, `y` |
//! | gaze_point | `timestamp`, `x`, `y` |
//! | eye_position | `timestamp`, `left_x`, `left_y`, `left_z`, `right_x`, `right_y`, `right_z` |
//!
//! Timestamps arrive as `f64` milliseconds and are narrowed to `f32`.

use contracts::{BehaviorPayload, BehaviorType, FixationSubtype, MeasurementRecord, Point3};
use serde_json::Value;

use crate::error::{IngestionError, Result};

/// Fixation event parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationParams {
    pub timestamp_ms: f32,
    pub subtype: FixationSubtype,
    pub x: f32,
    pub y: f32,
}

/// Gaze point event parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazePointParams {
    pub timestamp_ms: f32,
    pub x: f32,
    pub y: f32,
}

/// Eye position event parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePositionParams {
    pub timestamp_ms: f32,
    pub left: Point3,
    pub right: Point3,
}

fn number(payload: &BehaviorPayload, key: &'static str) -> Result<f32> {
    let behavior = payload.behavior_type;
    let value = payload
        .param(key)
        .ok_or(IngestionError::MissingParam { behavior, key })?
        .as_f64()
        .ok_or(IngestionError::NotANumber { behavior, key })?;

    let narrowed = value as f32;
    if !value.is_finite() || !narrowed.is_finite() {
        return Err(IngestionError::NonFinite {
            behavior,
            key,
            value,
        });
    }
    Ok(narrowed)
}

fn fixation_subtype(payload: &BehaviorPayload) -> Result<FixationSubtype> {
    let value = payload
        .param("event_type")
        .ok_or(IngestionError::MissingParam {
            behavior: BehaviorType::Fixation,
            key: "event_type",
        })?;

    match value {
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "begin" => Ok(FixationSubtype::Begin),
            "data" => Ok(FixationSubtype::Data),
            "end" => Ok(FixationSubtype::End),
            _ => Err(IngestionError::UnknownFixationType(s.clone())),
        },
        other => Err(IngestionError::UnknownFixationType(other.to_string())),
    }
}

impl TryFrom<&BehaviorPayload> for FixationParams {
    type Error = IngestionError;

    fn try_from(payload: &BehaviorPayload) -> Result<Self> {
        Ok(Self {
            timestamp_ms: number(payload, "timestamp")?,
            subtype: fixation_subtype(payload)?,
            x: number(payload, "x")?,
            y: number(payload, "y")?,
        })
    }
}

impl TryFrom<&BehaviorPayload> for GazePointParams {
    type Error = IngestionError;

    fn try_from(payload: &BehaviorPayload) -> Result<Self> {
        Ok(Self {
            timestamp_ms: number(payload, "timestamp")?,
            x: number(payload, "x")?,
            y: number(payload, "y")?,
        })
    }
}

impl TryFrom<&BehaviorPayload> for EyePositionParams {
    type Error = IngestionError;

    fn try_from(payload: &BehaviorPayload) -> Result<Self> {
        Ok(Self {
            timestamp_ms: number(payload, "timestamp")?,
            left: Point3 {
                x: number(payload, "left_x")?,
                y: number(payload, "left_y")?,
                z: number(payload, "left_z")?,
            },
            right: Point3 {
                x: number(payload, "right_x")?,
                y: number(payload, "right_y")?,
                z: number(payload, "right_z")?,
            },
        })
    }
}

impl From<FixationParams> for MeasurementRecord {
    fn from(p: FixationParams) -> Self {
        MeasurementRecord::Fixation {
            timestamp_ms: p.timestamp_ms,
            subtype: p.subtype,
            x: p.x,
            y: p.y,
        }
    }
}

impl From<GazePointParams> for MeasurementRecord {
    fn from(p: GazePointParams) -> Self {
        MeasurementRecord::GazePoint {
            timestamp_ms: p.timestamp_ms,
            x: p.x,
            y: p.y,
        }
    }
}

impl From<EyePositionParams> for MeasurementRecord {
    fn from(p: EyePositionParams) -> Self {
        MeasurementRecord::EyePosition {
            timestamp_ms: p.timestamp_ms,
            left: p.left,
            right: p.right,
        }
    }
}
