//! Transport error types

use thiserror::Error;

/// Failures while opening the outbound connection
#[derive(Debug, Error)]
pub enum TransportError {
    /// Host name resolution failed
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Resolution succeeded but returned nothing
    #[error("no address found for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    /// Every resolved address refused or timed out
    #[error("failed to connect to {peer}: {source}")]
    Connect {
        peer: String,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// Create a connect error
    pub fn connect(peer: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            peer: peer.into(),
            source,
        }
    }
}
