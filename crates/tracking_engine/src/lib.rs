//! # Tracking Engine
//!
//! Notification sources implementing `contracts::TrackingEngine`.
//!
//! - `MockTrackingEngine`: synthetic fixations, gaze points and eye positions
//! - `ReplayTrackingEngine`: recorded notifications from a JSON-lines file
//!
//! Both deliver connection-state changes and events on their own
//! connection thread, the way the vendor engine calls back on its threads.
//! Events flow only after `commit_subscription`, which is valid once the
//! engine has reported `Connected`.

mod context;
mod error;
mod mock;
mod replay;

pub use error::{ReplayError, Result};
pub use mock::MockTrackingEngine;
pub use replay::{RecordedEvent, ReplayConfig, ReplayTrackingEngine};
