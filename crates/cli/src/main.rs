//! # Eyestream CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - `<host> <port>` stream target, degraded (log only) mode without it
//! - Configuration loading and command-line overrides
//! - Exit on Enter, Ctrl+C / SIGTERM or after `--duration`
//! - `--print-config` to show the resolved configuration
//!
//! The exit code is always 0.

mod cli;
mod error;
mod run;
mod signal;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::{error, info};

use cli::{Cli, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = parse_args();

    // Initialize logging based on CLI options
    if let Err(e) = init_logging(&cli) {
        eprintln!("{e:#}");
    }

    if let Some(format) = cli.print_config {
        match run::render_config(&cli, format) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => error!(error = ?e, "Failed to print configuration"),
        }
        return Ok(());
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Eyestream starting");

    let report = run::run_session(&cli).await;
    report.print_summary();

    info!("Eyestream finished");
    Ok(())
}

/// Parse arguments; anything but help/version falls back to a degraded run
fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            eprintln!("{USAGE}");
            Cli::fallback()
        }
    }
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.metrics_port,
        default_log_level: cli.log_level().to_string(),
    })
}
