//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Engine timestamps are milliseconds since system boot (`f64`)
//! - On the wire every field, timestamps included, is a big-endian `f32`

mod config;
mod engine;
mod error;
mod frame;
mod record;
mod sink;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use frame::OutboundFrame;
pub use record::*;
pub use sink::*;
