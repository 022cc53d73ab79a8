//! Configuration validation
//!
//! Rules:
//! - queue_capacity > 0
//! - interactor_id non-empty
//! - mock frequency_hz and screen size > 0
//! - replay speed_multiplier > 0, path required when source = replay

use contracts::{ContractError, EngineSource, StreamerConfig};

/// Validate a StreamerConfig
///
/// Returns the first error found, or Ok(()).
pub fn validate(config: &StreamerConfig) -> Result<(), ContractError> {
    validate_stream(config)?;
    validate_interactor(config)?;
    validate_mock(config)?;
    validate_replay(config)?;
    Ok(())
}

fn validate_stream(config: &StreamerConfig) -> Result<(), ContractError> {
    if config.stream.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "stream.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_interactor(config: &StreamerConfig) -> Result<(), ContractError> {
    if config.engine.interactor_id.trim().is_empty() {
        return Err(ContractError::config_validation(
            "engine.interactor_id",
            "interactor_id cannot be empty",
        ));
    }
    Ok(())
}

fn validate_mock(config: &StreamerConfig) -> Result<(), ContractError> {
    let mock = &config.engine.mock;
    let checks = [
        ("engine.mock.frequency_hz", mock.frequency_hz),
        ("engine.mock.screen_width", mock.screen_width),
        ("engine.mock.screen_height", mock.screen_height),
    ];

    for (field, value) in checks {
        // NaN fails this comparison too
        if !(value > 0.0) {
            return Err(ContractError::config_validation(
                field,
                format!("must be > 0, got {value}"),
            ));
        }
    }
    Ok(())
}

fn validate_replay(config: &StreamerConfig) -> Result<(), ContractError> {
    let replay = &config.engine.replay;

    if !(replay.speed_multiplier > 0.0) {
        return Err(ContractError::config_validation(
            "engine.replay.speed_multiplier",
            format!(
                "speed_multiplier must be > 0, got {}",
                replay.speed_multiplier
            ),
        ));
    }

    if config.engine.source == EngineSource::Replay && replay.path.is_none() {
        return Err(ContractError::config_validation(
            "engine.replay.path",
            "path is required when engine.source = \"replay\"",
        ));
    }
    Ok(())
}
