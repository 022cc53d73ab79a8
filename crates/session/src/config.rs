//! Session configuration

use std::fmt;
use std::time::Duration;

use contracts::{InteractorSpec, StreamerConfig};

/// Upper bound on draining the writer at shutdown
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Remote consumer address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub host: String,
    pub port: u16,
}

impl StreamTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for StreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Consumer to stream to; `None` runs degraded (log only)
    pub target: Option<StreamTarget>,

    /// Pause between transport setup and engine setup
    pub startup_delay: Duration,

    /// Writer queue capacity
    pub queue_capacity: usize,

    /// Global interactor subscription
    pub interactor: InteractorSpec,

    /// How long teardown waits for queued frames and the terminate
    /// sentinel to reach the consumer
    pub shutdown_grace: Duration,
}

impl SessionConfig {
    /// Build from the loaded streamer configuration
    pub fn from_streamer_config(target: Option<StreamTarget>, config: &StreamerConfig) -> Self {
        Self {
            target,
            startup_delay: config.stream.startup_delay(),
            queue_capacity: config.stream.queue_capacity,
            interactor: config.engine.interactor_spec(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_streamer_config(None, &StreamerConfig::default())
    }
}
