//! # Ingestion
//!
//! Turns tracking engine notifications into measurement records.
//!
//! Responsibilities:
//! - Extract and validate fixation, gaze point and eye position payloads
//! - Log every decoded event, streaming or not
//! - Encode records and queue them for the stream writer without blocking
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{EventAdapter, SessionContext};
//! use std::sync::Arc;
//!
//! let session = SessionContext::streaming(writer.sender());
//! let adapter = Arc::new(EventAdapter::new(session));
//! engine.register_event_handler(adapter.callback())?;
//! ```

mod adapter;
mod error;
mod extract;
mod metrics;
mod session;

pub use adapter::EventAdapter;
pub use error::{IngestionError, Result};
pub use extract::{EyePositionParams, FixationParams, GazePointParams};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use session::{ForwardOutcome, SessionContext};
