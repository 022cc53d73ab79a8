//! Tracking engine error types

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a replay recording
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Recording could not be read
    #[error("failed to read recording {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line is not a valid recorded event
    #[error("invalid recorded event at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias
pub type Result<T> = std::result::Result<T, ReplayError>;
