//! Session wiring: configuration, engine selection and the exit signal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{EngineSource, StreamerConfig, TrackingEngine};
use session::{SessionConfig, SessionController, SessionReport, StreamTarget};
use tracing::{info, warn};
use tracking_engine::{MockTrackingEngine, ReplayConfig, ReplayTrackingEngine};

use crate::cli::{Cli, ConfigFormatArg, USAGE};
use crate::signal::exit_signal;

/// Run one streaming session; every failure along the way degrades
pub async fn run_session(cli: &Cli) -> SessionReport {
    let target = resolve_target(cli);
    let config = resolve_config(cli);

    if cli.metrics_port.is_none() {
        if let Some(port) = config.observability.metrics_port {
            if let Err(e) = observability::init_metrics_only(port) {
                warn!(port, error = %e, "Metrics exporter disabled");
            }
        }
    }

    let session_config = SessionConfig::from_streamer_config(target, &config);
    let deadline = (cli.duration > 0).then(|| Duration::from_secs(cli.duration));

    match build_replay_engine(&config) {
        Some(engine) => drive(session_config, engine, deadline).await,
        None => {
            let engine = MockTrackingEngine::new(config.engine.mock.clone());
            drive(session_config, engine, deadline).await
        }
    }
}

async fn drive<E: TrackingEngine + 'static>(
    config: SessionConfig,
    engine: E,
    deadline: Option<Duration>,
) -> SessionReport {
    info!(engine = engine.name(), "Tracking engine selected");
    if deadline.is_none() {
        info!("Press Enter to exit");
    }

    SessionController::new(config, Arc::new(engine))
        .run(exit_signal(deadline))
        .await
}

/// Resolved configuration rendered for `--print-config`
pub fn render_config(cli: &Cli, format: ConfigFormatArg) -> Result<String> {
    let config = resolve_config(cli);
    let rendered = match format {
        ConfigFormatArg::Toml => ConfigLoader::to_toml(&config),
        ConfigFormatArg::Json => ConfigLoader::to_json(&config),
    };
    rendered.context("Failed to render configuration")
}

/// Positional `<host> <port>`, or `None` after printing usage
fn resolve_target(cli: &Cli) -> Option<StreamTarget> {
    match cli.stream_target() {
        Ok(target) => Some(target),
        Err(e) => {
            eprintln!("{USAGE}");
            warn!(error = %e, "Eye tracking data will not be streamed");
            None
        }
    }
}

/// Config file (or defaults) with CLI overrides applied
fn resolve_config(cli: &Cli) -> StreamerConfig {
    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = ?e, "Using default configuration");
                StreamerConfig::default()
            }
        },
        None => StreamerConfig::default(),
    };

    apply_overrides(&mut config, cli);

    if let Err(e) = ConfigLoader::validate(&config) {
        warn!(error = %e, "Configuration is inconsistent after command-line overrides");
    }

    info!(
        source = ?config.engine.source,
        interactor = %config.engine.interactor_id,
        startup_delay_ms = config.stream.startup_delay_ms,
        queue_capacity = config.stream.queue_capacity,
        "Configuration resolved"
    );
    config
}

fn load_config(path: &std::path::Path) -> Result<StreamerConfig> {
    info!(config = %path.display(), "Loading configuration");
    ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

fn apply_overrides(config: &mut StreamerConfig, cli: &Cli) {
    if let Some(engine) = cli.engine {
        config.engine.source = engine.into();
    }
    if let Some(path) = &cli.replay {
        info!(replay = %path.display(), "Overriding replay recording from CLI");
        config.engine.replay.path = Some(path.clone());
        if cli.engine.is_none() {
            config.engine.source = EngineSource::Replay;
        }
    }
    if let Some(delay) = cli.startup_delay_ms {
        config.stream.startup_delay_ms = delay;
    }
    if let Some(port) = cli.metrics_port {
        config.observability.metrics_port = Some(port);
    }
}

/// Replay engine when configured and loadable; `None` falls back to the mock
fn build_replay_engine(config: &StreamerConfig) -> Option<ReplayTrackingEngine> {
    if config.engine.source != EngineSource::Replay {
        return None;
    }

    let Some(path) = &config.engine.replay.path else {
        warn!("Replay engine selected without a recording, using the mock engine");
        return None;
    };

    match ReplayTrackingEngine::load(path, ReplayConfig::from(&config.engine.replay)) {
        Ok(engine) => {
            info!(events = engine.len(), replay = %path.display(), "Replay recording loaded");
            Some(engine)
        }
        Err(e) => {
            warn!(error = %e, "Failed to load replay recording, using the mock engine");
            None
        }
    }
}
