//! Layered error definitions
//!
//! Categorized by source: config / engine / payload / transport

use thiserror::Error;

use crate::EngineStep;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Tracking Engine Errors =====
    /// A tracking engine setup or lifecycle call failed
    #[error("tracking engine step '{step}' failed: {message}")]
    Engine { step: EngineStep, message: String },

    /// Behavior payload could not be interpreted
    #[error("payload parse error for {behavior} behavior: {message}")]
    PayloadParse { behavior: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create tracking engine error
    pub fn engine(step: EngineStep, message: impl Into<String>) -> Self {
        Self::Engine {
            step,
            message: message.into(),
        }
    }

    /// Create payload parse error
    pub fn payload_parse(behavior: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadParse {
            behavior: behavior.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
