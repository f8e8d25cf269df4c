//! Default values for configuration types.

use crate::config::types::Config;
use std::path::PathBuf;

/// Port the agent web UI listens on unless told otherwise.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Poll cadence right after new log content arrived.
pub const DEFAULT_FAST_INTERVAL_MS: u64 = 25;

/// Poll cadence while idle.
pub const DEFAULT_SLOW_INTERVAL_MS: u64 = 250;

/// Number of fast cycles granted by each update.
pub const DEFAULT_BURST_LENGTH: u32 = 100;

pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Resolve the timezone sent with poll requests.
///
/// Order: explicit config value, then a non-empty `$TZ` (leading `:` stripped,
/// as glibc allows), then the system zone, then UTC.
pub fn resolve_timezone(configured: Option<&str>) -> String {
    choose_timezone(
        configured,
        std::env::var("TZ").ok(),
        iana_time_zone::get_timezone().ok(),
    )
}

fn choose_timezone(
    configured: Option<&str>,
    env_tz: Option<String>,
    system: Option<String>,
) -> String {
    let non_empty = |tz: &str| {
        let tz = tz.trim().trim_start_matches(':');
        (!tz.is_empty()).then(|| tz.to_string())
    };

    configured
        .and_then(non_empty)
        .or_else(|| env_tz.as_deref().and_then(non_empty))
        .or_else(|| system.as_deref().and_then(non_empty))
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
}

fn default_tether_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("TETHER_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    match dirs::home_dir() {
        Some(home) => home.join(".tether"),
        None => {
            eprintln!(
                "Warning: Could not find home directory. Set HOME or TETHER_HOME environment variable. \
                Using fallback directory."
            );
            std::env::temp_dir().join(".tether")
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tether_dir: default_tether_dir(),
        }
    }
}
