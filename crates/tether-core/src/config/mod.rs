//! # Configuration System
//!
//! Hierarchical TOML configuration for tether.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.tether/config.toml` (global user preferences)
//! 3. **Project config** - `./.tether/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Usage Example
//!
//! ```toml
//! # ~/.tether/config.toml
//! [backend]
//! url = "http://localhost:5000"
//! username = "admin"
//! password = "hunter2"
//!
//! [polling]
//! slow_interval_ms = 500
//! ```
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use tether_core::config::TetherConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TetherConfig::load_hierarchy()?;
//!     println!("polling {}", config.backend.url());
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

// Public API exports
pub use types::{BackendConfig, Config, PollingConfig, SpeechConfig, TetherConfig};
pub use validation::validate_config;

impl TetherConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, Box<dyn std::error::Error>> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
