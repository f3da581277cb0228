//! Application configuration
//!
//! Split into focused sub-modules:
//! - `autosave`: debounce delay, draft limit, retention
//! - `storage`: store backend and quota
//!
//! Telemetry settings live next to the subscriber setup in
//! [`crate::telemetry`].

mod autosave;
mod storage;

use std::path::Path;

use application::error::ApplicationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use autosave::AutosaveConfig;
pub use storage::{StorageBackend, StorageConfig};

use crate::telemetry::TelemetryConfig;

/// Prefix of environment variable overrides, e.g. `DRAFTS_AUTOSAVE__MAX_DRAFTS`
pub const ENV_PREFIX: &str = "DRAFTS";

/// Optional configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "drafts";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub autosave: AutosaveConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from `drafts.toml` (if present) and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `file` instead of the default file
    ///
    /// An explicitly given file must exist.
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::build(file, env_source())
    }

    fn build(
        file: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            // Start with defaults
            .set_default("autosave.delay_ms", 2000)?
            .set_default("storage.backend", "redb")?
            // Add config file
            .add_source(file_source)
            // Override with environment variables (e.g., DRAFTS_STORAGE__PATH)
            .add_source(env)
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        debug!(?app_config, "Configuration loaded");
        Ok(app_config)
    }

    /// Reject settings the autosave service cannot work with
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending setting.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.autosave.max_drafts == 0 {
            return Err(ApplicationError::Configuration(
                "autosave.max_drafts must be at least 1".to_string(),
            ));
        }
        if self.autosave.delay_ms == 0 {
            return Err(ApplicationError::Configuration(
                "autosave.delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.autosave.cleanup_interval_secs == 0 {
            return Err(ApplicationError::Configuration(
                "autosave.cleanup_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
