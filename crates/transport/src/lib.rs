//! # Transport
//!
//! Outbound byte stream to the remote consumer.
//!
//! - `TcpTransport`: one TCP connection, opened once, never reconnected
//! - `StreamWriter`: the single task that owns the sink and writes frames in
//!   queue order, so concurrent engine notifications never interleave on the
//!   socket
//!
//! Write failures are returned as `Result`s by the sink and turned into log
//! events and metrics by the writer; producers never see them.

pub mod error;
pub mod metrics;
pub mod tcp;
pub mod writer;

pub use contracts::{OutboundFrame, StreamSink};
pub use error::TransportError;
pub use metrics::{WriterMetrics, WriterSnapshot};
pub use tcp::{TcpTransport, TransportState};
pub use writer::{StreamWriter, WriterReport};
