//! Error types for CLI operations.

use thiserror::Error;

/// Problems with the positional stream target
///
/// None of these abort the process: the session runs without streaming.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    /// Not exactly `<host> <port>`
    #[error("expected 2 positional arguments (<host> <port>), got {count}")]
    WrongArity { count: usize },

    /// Port is not a number in 0..=65535
    #[error("invalid port '{value}'")]
    InvalidPort { value: String },
}

impl CliError {
    pub fn wrong_arity(count: usize) -> Self {
        Self::WrongArity { count }
    }

    pub fn invalid_port(value: impl Into<String>) -> Self {
        Self::InvalidPort {
            value: value.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
