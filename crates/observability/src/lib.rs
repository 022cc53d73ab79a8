//! # Observability
//!
//! Tracing setup and Prometheus metrics for the streamer.
//!
//! ## Features
//!
//! - Tracing initialization (JSON / Pretty / Compact)
//! - Optional Prometheus exporter
//! - Metric helpers with consistent names and labels
//!
//! ## Usage
//!
//! ```ignore
//! use observability::{init_with_config, metrics, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig::default())?;
//! metrics::record_streaming_enabled(true);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_connection_state, record_event_received, record_frame_dropped, record_frame_forwarded,
    record_frame_written, record_parse_error, record_streaming_enabled, record_write_latency_ms,
    RunningStats, StatsSummary,
};

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Default log level, overridden by RUST_LOG
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Multi-line human readable
    Pretty,
    /// Single-line human readable
    #[default]
    Compact,
}

/// Initialize tracing and, if configured, the Prometheus exporter
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().pretty();

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer().compact().with_target(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus exporter
///
/// For callers that already own the tracing subscriber.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
