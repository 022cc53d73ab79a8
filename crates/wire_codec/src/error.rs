//! Codec error types

use thiserror::Error;

/// Decoding errors; encoding never fails
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// Not enough bytes for a complete frame
    #[error("incomplete frame: need {needed} bytes, have {available}")]
    Incomplete { needed: usize, available: usize },

    /// Byte count field is not one of the known frame sizes
    #[error("invalid byte count field: {0}")]
    InvalidByteCount(f32),

    /// Behavior type code is unknown
    #[error("unknown behavior code: {0}")]
    UnknownBehavior(f32),

    /// Byte count and behavior code disagree
    #[error("byte count {declared} does not match {expected} expected for behavior {behavior}")]
    LengthMismatch {
        behavior: f32,
        declared: usize,
        expected: usize,
    },

    /// Fixation subtype code outside {1, 2, 3}
    #[error("invalid fixation subtype code: {0}")]
    InvalidSubtype(f32),

    /// Bytes left over after a complete frame
    #[error("{0} trailing bytes after frame")]
    TrailingBytes(usize),
}

/// Codec Result alias
pub type Result<T> = std::result::Result<T, CodecError>;
