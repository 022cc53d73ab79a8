//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use contracts::EngineSource;
use session::StreamTarget;

use crate::error::{CliError, Result};

/// Usage line printed when the stream target is missing or malformed
pub const USAGE: &str = "Usage: eyestream <host> <port>";

/// Eyestream - eye-tracking data streamer
#[derive(Parser, Debug)]
#[command(
    name = "eyestream",
    author,
    version,
    about = "Stream eye-tracking data to a TCP consumer",
    long_about = "Subscribes to fixation, gaze point and eye position events from the tracking \n\
                  engine and streams them to <host>:<port> as big-endian f32 records.\n\n\
                  Without a valid <host> <port> the events are only logged."
)]
pub struct Cli {
    /// Consumer address: <host> <port>
    #[arg(value_name = "HOST PORT")]
    pub target: Vec<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "EYESTREAM_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        env = "EYESTREAM_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "EYESTREAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the tracking engine source
    #[arg(long, value_enum, env = "EYESTREAM_ENGINE")]
    pub engine: Option<EngineArg>,

    /// Replay recording (JSON lines); implies `--engine replay`
    #[arg(long, env = "EYESTREAM_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Override the delay between transport and engine setup (ms)
    #[arg(long, env = "EYESTREAM_STARTUP_DELAY_MS")]
    pub startup_delay_ms: Option<u64>,

    /// Exit automatically after N seconds (0 = wait for Enter or Ctrl+C)
    #[arg(long, default_value = "0", env = "EYESTREAM_DURATION")]
    pub duration: u64,

    /// Prometheus metrics port (overrides the config file)
    #[arg(long, env = "EYESTREAM_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Print the resolved configuration (file plus overrides) and exit
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub print_config: Option<ConfigFormatArg>,
}

impl Cli {
    /// Arguments used when the command line cannot be parsed at all:
    /// no target, default logging, no overrides
    pub fn fallback() -> Self {
        Self {
            target: Vec::new(),
            verbose: 0,
            quiet: false,
            log_format: LogFormat::default(),
            config: None,
            engine: None,
            replay: None,
            startup_delay_ms: None,
            duration: 0,
            metrics_port: None,
            print_config: None,
        }
    }

    /// Resolve the positional arguments into a stream target
    pub fn stream_target(&self) -> Result<StreamTarget> {
        match self.target.as_slice() {
            [host, port] => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| CliError::invalid_port(port.as_str()))?;
                Ok(StreamTarget::new(host.as_str(), port))
            }
            other => Err(CliError::wrong_arity(other.len())),
        }
    }

    /// Default log level from -v / -q
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Output format of `--print-config`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormatArg {
    Toml,
    Json,
}

/// Tracking engine source
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineArg {
    /// Synthetic eye movements
    Mock,
    /// Recorded notifications
    Replay,
}

impl From<EngineArg> for EngineSource {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Mock => Self::Mock,
            EngineArg::Replay => Self::Replay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("eyestream").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_host_and_port() {
        let cli = parse(&["127.0.0.1", "5555"]);
        assert_eq!(
            cli.stream_target(),
            Ok(StreamTarget::new("127.0.0.1", 5555))
        );
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(parse(&[]).stream_target(), Err(CliError::wrong_arity(0)));
        assert_eq!(
            parse(&["localhost"]).stream_target(),
            Err(CliError::wrong_arity(1))
        );
        assert_eq!(
            parse(&["localhost", "1", "2"]).stream_target(),
            Err(CliError::wrong_arity(3))
        );
    }

    #[test]
    fn test_invalid_port() {
        assert_eq!(
            parse(&["localhost", "http"]).stream_target(),
            Err(CliError::invalid_port("http"))
        );
        assert_eq!(
            parse(&["localhost", "70000"]).stream_target(),
            Err(CliError::invalid_port("70000"))
        );
    }

    #[test]
    fn test_flags_mix_with_positionals() {
        let cli = parse(&["-vv", "--engine", "replay", "host", "9000", "--duration", "5"]);
        assert_eq!(cli.stream_target(), Ok(StreamTarget::new("host", 9000)));
        assert_eq!(cli.engine, Some(EngineArg::Replay));
        assert_eq!(cli.duration, 5);
        assert_eq!(cli.log_level(), "trace");
    }

    #[test]
    fn test_print_config_format() {
        assert_eq!(
            parse(&["--print-config", "json"]).print_config,
            Some(ConfigFormatArg::Json)
        );
        assert!(parse(&[]).print_config.is_none());
        assert!(Cli::try_parse_from(["eyestream", "--print-config", "yaml"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["eyestream", "-q", "-v"]);
        assert!(result.is_err());
        assert_eq!(parse(&["-q"]).log_level(), "warn");
    }
}
