//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.tether/config.toml` (or `$TETHER_HOME/config.toml`)
//! 3. **Project config** - `./.tether/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)

use crate::config::types::{BackendConfig, Config, PollingConfig, SpeechConfig, TetherConfig};
use crate::config::validation::validate_config;
use std::fs;
use std::path::{Path, PathBuf};

/// Check if an error is a "file not found" error.
fn is_file_not_found(e: &(dyn std::error::Error + 'static)) -> bool {
    if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
        return io_err.kind() == std::io::ErrorKind::NotFound;
    }

    let err_str = e.to_string();
    err_str.contains("No such file or directory") || err_str.contains("cannot find the path")
}

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed, or if
/// validation fails. Missing config files are not errors.
pub fn load_hierarchy() -> Result<TetherConfig, Box<dyn std::error::Error>> {
    let user_path = Config::default().user_config_path();
    let project_path = std::env::current_dir()?.join(".tether").join("config.toml");
    load_from_paths(&[user_path, project_path])
}

/// Load and merge config files in order, later files taking precedence.
pub fn load_from_paths(paths: &[PathBuf]) -> Result<TetherConfig, Box<dyn std::error::Error>> {
    let mut config = TetherConfig::default();

    for path in paths {
        match load_config_file(path) {
            Ok(file_config) => config = merge_configs(config, file_config),
            Err(e) if !is_file_not_found(e.as_ref()) => return Err(e),
            Err(_) => {} // File not found - continue with what we have
        }
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load a configuration file from the given path.
fn load_config_file(path: &Path) -> Result<TetherConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Box::new(e) as Box<dyn std::error::Error>
        } else {
            format!("Failed to read config file '{}': {}", path.display(), e).into()
        }
    })?;
    let config: TetherConfig = toml::from_str(&content)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
    Ok(config)
}

/// Merge two configurations, with override_config taking precedence.
///
/// Override values replace base values only if present.
pub fn merge_configs(base: TetherConfig, override_config: TetherConfig) -> TetherConfig {
    TetherConfig {
        backend: BackendConfig {
            url: override_config.backend.url.or(base.backend.url),
            request_timeout_ms: override_config
                .backend
                .request_timeout_ms
                .or(base.backend.request_timeout_ms),
            timezone: override_config.backend.timezone.or(base.backend.timezone),
            username: override_config.backend.username.or(base.backend.username),
            password: override_config.backend.password.or(base.backend.password),
        },
        polling: PollingConfig {
            fast_interval_ms: override_config
                .polling
                .fast_interval_ms
                .or(base.polling.fast_interval_ms),
            slow_interval_ms: override_config
                .polling
                .slow_interval_ms
                .or(base.polling.slow_interval_ms),
            burst_length: override_config
                .polling
                .burst_length
                .or(base.polling.burst_length),
        },
        speech: SpeechConfig {
            command: override_config.speech.command.or(base.speech.command),
        },
    }
}
