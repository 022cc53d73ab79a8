//! StreamSink trait - stream writer output interface
//!
//! Defines the abstract interface for the byte-stream destination.

use crate::{ContractError, OutboundFrame};

/// Frame output trait
///
/// The TCP transport implements this trait; tests substitute in-memory sinks.
#[trait_variant::make(StreamSink: Send)]
pub trait LocalStreamSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one encoded frame
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, frame: &OutboundFrame) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink; must be idempotent
    async fn close(&mut self) -> Result<(), ContractError>;
}
