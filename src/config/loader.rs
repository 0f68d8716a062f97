//! Configuration Loader
//!
//! Layers an optional YAML file under `SANDBOXBERRY__SECTION__KEY` environment overrides
//! and validates the merged result.

use super::error::{ConfigResult, ConfigurationError};
use super::SandboxberryConfig;
use crate::constants::{CONFIG_ENV_PREFIX, ENVIRONMENT_VAR};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: SandboxberryConfig,
    environment: String,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: Option<impl AsRef<Path>>) -> ConfigResult<Arc<ConfigManager>> {
        let path = path.map(|p| p.as_ref().to_path_buf());
        Self::load_with_env(path, None)
    }

    /// Load configuration with an explicit override map instead of the process environment.
    /// This is useful for testing without modifying global environment variables.
    pub fn load_with_env(
        path: Option<PathBuf>,
        env_overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        let mut builder = config::Config::builder();

        if let Some(ref file) = path {
            if !file.is_file() {
                return Err(ConfigurationError::ConfigFileNotFound { path: file.clone() });
            }
            builder = builder.add_source(config::File::from(file.as_path()).required(true));
        }

        let environment_source = config::Environment::with_prefix(CONFIG_ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(env_overrides);
        builder = builder.add_source(environment_source);

        let config: SandboxberryConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            "Configuration loaded: {}",
            serde_json::to_string(&config).unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            environment = %environment,
            config_file = ?path,
            max_concurrent_submissions = config.migration.max_concurrent_submissions,
            retry_attempts = config.retry.max_attempts,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            config_file: path,
        }))
    }

    /// Wrap an in-memory configuration after validating it
    pub fn from_config(config: SandboxberryConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
            config_file: None,
        }))
    }

    pub fn config(&self) -> &SandboxberryConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Current environment from `SANDBOXBERRY_ENV`, defaulting to development
    pub fn detect_environment() -> String {
        env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string())
    }
}
