use crate::config::types::TetherConfig;
use crate::errors::ConfigError;

/// Validate a merged configuration.
pub fn validate_config(config: &TetherConfig) -> Result<(), ConfigError> {
    let url = config.backend.url().trim();
    if url.is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidBackendUrl {
            url: url.to_string(),
        });
    }

    if config.backend.request_timeout().is_zero() {
        return Err(ConfigError::InvalidConfiguration {
            message: "backend.request_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.backend.username.is_some() != config.backend.password.is_some() {
        return Err(ConfigError::InvalidConfiguration {
            message: "backend.username and backend.password must be set together".to_string(),
        });
    }

    let fast = config.polling.fast_interval();
    let slow = config.polling.slow_interval();
    if fast.is_zero() || slow.is_zero() {
        return Err(ConfigError::InvalidConfiguration {
            message: "polling intervals must be greater than 0".to_string(),
        });
    }
    if fast > slow {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "polling.fast_interval_ms ({}) must not exceed polling.slow_interval_ms ({})",
                fast.as_millis(),
                slow.as_millis()
            ),
        });
    }

    Ok(())
}
