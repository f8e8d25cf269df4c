//! Configuration type definitions for tether.
//!
//! These types are serialized/deserialized from TOML config files. Every
//! overridable field is optional so that a project config only replaces the
//! values it actually sets; accessors resolve the built-in defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! url = "http://localhost:5000"
//! request_timeout_ms = 10000
//! timezone = "Europe/Prague"
//!
//! [polling]
//! fast_interval_ms = 25
//! slow_interval_ms = 250
//! burst_length = 100
//!
//! [speech]
//! command = "say"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration derived from environment variables and system
/// defaults, not from config files.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for all tether data (default: ~/.tether, or `$TETHER_HOME`)
    pub tether_dir: PathBuf,
}

impl Config {
    /// Path of the user-level config file.
    pub fn user_config_path(&self) -> PathBuf {
        self.tether_dir.join("config.toml")
    }

    /// Path of the persisted preference store.
    pub fn preferences_path(&self) -> PathBuf {
        self.tether_dir.join("preferences.json")
    }
}

/// Main configuration loaded from TOML config files.
///
/// Loaded from:
/// 1. User config: `~/.tether/config.toml`
/// 2. Project config: `./.tether/config.toml`
///
/// Project config values override user config values.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TetherConfig {
    /// Backend endpoint and transport settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Adaptive polling cadence
    #[serde(default)]
    pub polling: PollingConfig,

    /// Text-to-speech settings
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BackendConfig {
    /// Base URL of the agent backend.
    /// Default: http://localhost:5000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Per-request timeout in milliseconds. Expiry counts as a transport failure.
    /// Default: 10000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,

    /// IANA timezone sent with every poll. Falls back to `$TZ`, then UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// HTTP basic auth login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// HTTP basic auth password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl BackendConfig {
    pub fn url(&self) -> &str {
        self.url
            .as_deref()
            .unwrap_or(super::defaults::DEFAULT_BACKEND_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .unwrap_or(super::defaults::DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    pub fn timezone(&self) -> String {
        super::defaults::resolve_timezone(self.timezone.as_deref())
    }

    /// Basic auth credentials, if both halves are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }
}

/// Adaptive polling cadence.
///
/// After every poll that brings new log content the loop polls at the fast
/// interval for `burst_length` cycles, then decays to the slow interval.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PollingConfig {
    /// Default: 25ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_interval_ms: Option<u64>,

    /// Default: 250ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slow_interval_ms: Option<u64>,

    /// Default: 100 cycles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_length: Option<u32>,
}

impl PollingConfig {
    pub fn fast_interval(&self) -> Duration {
        Duration::from_millis(
            self.fast_interval_ms
                .unwrap_or(super::defaults::DEFAULT_FAST_INTERVAL_MS),
        )
    }

    pub fn slow_interval(&self) -> Duration {
        Duration::from_millis(
            self.slow_interval_ms
                .unwrap_or(super::defaults::DEFAULT_SLOW_INTERVAL_MS),
        )
    }

    pub fn burst_length(&self) -> u32 {
        self.burst_length
            .unwrap_or(super::defaults::DEFAULT_BURST_LENGTH)
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SpeechConfig {
    /// Command used to read responses aloud. The text is passed as the last
    /// argument. When unset, the first of `say`, `espeak-ng`, `espeak`,
    /// `spd-say` found on PATH is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}
