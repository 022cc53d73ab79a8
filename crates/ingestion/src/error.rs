//! Ingestion error types

use contracts::BehaviorType;
use thiserror::Error;

/// Behavior payload extraction failure
///
/// Each one drops exactly one record; the adapter logs it and moves on.
#[derive(Debug, Error, PartialEq)]
pub enum IngestionError {
    /// Required parameter absent from the payload
    #[error("{behavior} payload is missing '{key}'")]
    MissingParam {
        behavior: BehaviorType,
        key: &'static str,
    },

    /// Parameter present but not a number
    #[error("{behavior} payload field '{key}' is not a number")]
    NotANumber {
        behavior: BehaviorType,
        key: &'static str,
    },

    /// Parameter is NaN, infinite, or overflows a 32-bit float
    #[error("{behavior} payload field '{key}' is not a finite f32: {value}")]
    NonFinite {
        behavior: BehaviorType,
        key: &'static str,
        value: f64,
    },

    /// Fixation event type is not begin / data / end
    #[error("unrecognized fixation event type '{0}'")]
    UnknownFixationType(String),
}

impl IngestionError {
    /// Behavior the failing payload belonged to
    pub fn behavior(&self) -> BehaviorType {
        match self {
            Self::MissingParam { behavior, .. }
            | Self::NotANumber { behavior, .. }
            | Self::NonFinite { behavior, .. } => *behavior,
            Self::UnknownFixationType(_) => BehaviorType::Fixation,
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
