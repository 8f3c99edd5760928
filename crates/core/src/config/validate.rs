use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Engine timing and assembly parameters are usable
/// - At least one speech provider is configured
/// - Artifacts are published under a URL path
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    let engine = &config.engine;
    if engine.discovery_timeout_ms == 0 {
        return Err(invalid("engine.discovery_timeout_ms must be greater than 0"));
    }
    if engine.crossfade_secs <= 0.0 {
        return Err(invalid("engine.crossfade_secs must be positive"));
    }
    if engine.fps == 0 {
        return Err(invalid("engine.fps cannot be 0"));
    }
    if engine.target_height == 0 || engine.target_height % 2 != 0 {
        return Err(invalid("engine.target_height must be a positive even number"));
    }
    if !(engine.music_volume > 0.0 && engine.music_volume <= 1.0) {
        return Err(invalid("engine.music_volume must be in (0, 1]"));
    }

    // An empty speech chain would make every run fail at the voice stage
    if config.providers.speech.is_empty() {
        return Err(invalid("providers.speech must list at least one provider"));
    }

    // The server mounts the artifact directory at this path
    if !config.storage.public_base.starts_with('/') {
        return Err(invalid("storage.public_base must start with '/'"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
