use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Client limits and timeouts are non-zero, backend URL parses
/// - OMDb key is set when the section is present
/// - Entry defaults are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.client.min_query_len == 0 {
        return Err(ConfigError::ValidationError(
            "client.min_query_len must be at least 1".to_string(),
        ));
    }

    if config.client.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "client.request_timeout_secs cannot be 0".to_string(),
        ));
    }

    reqwest::Url::parse(&config.client.backend_url).map_err(|e| {
        ConfigError::ValidationError(format!(
            "client.backend_url '{}' is not a valid URL: {}",
            config.client.backend_url, e
        ))
    })?;

    if let Some(omdb) = &config.omdb {
        if omdb.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "omdb.api_key cannot be empty".to_string(),
            ));
        }
        if omdb.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "omdb.timeout_secs cannot be 0".to_string(),
            ));
        }
    }

    if config.defaults.runtime_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "defaults.runtime_minutes cannot be 0".to_string(),
        ));
    }

    if config.defaults.actors.is_empty() {
        return Err(ConfigError::ValidationError(
            "defaults.actors needs at least one placeholder".to_string(),
        ));
    }

    Ok(())
}
