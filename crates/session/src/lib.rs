//! # Session
//!
//! Lifecycle of one streaming session:
//!
//! 1. Connecting: open the transport if a target was given
//! 2. Startup delay
//! 3. Engine setup, best effort: every failing step is logged and skipped
//! 4. Streaming until the exit signal resolves
//! 5. Teardown: engine first, then terminate sentinel and transport close
//!
//! Nothing in here fails the process; the outcome is a `SessionReport`.

mod config;
mod controller;
mod report;

pub use config::{SessionConfig, StreamTarget, DEFAULT_SHUTDOWN_GRACE};
pub use controller::SessionController;
pub use report::SessionReport;
