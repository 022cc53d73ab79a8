//! Configuration parsing
//!
//! Supports TOML (primary) and JSON.

use contracts::{ContractError, StreamerConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<StreamerConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<StreamerConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<StreamerConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
