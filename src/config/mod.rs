//! # Sandboxberry Configuration System
//!
//! Run-level settings that sit beside the manifest: submission concurrency, retry and
//! backoff for remote API calls, and the user substitution policy.
//!
//! ## Architecture
//!
//! - **Layered sources**: an optional YAML file overlaid by `SANDBOXBERRY__*` environment
//!   variables (see [`ConfigManager`])
//! - **Defaults everywhere**: every section is optional and falls back to safe defaults
//! - **Explicit validation**: nonsensical values are rejected before a run starts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sandboxberry::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load(Some("config/sandboxberry.yaml"))?;
//! let concurrency = manager.config().migration.max_concurrent_submissions;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring sandboxberry.yaml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SandboxberryConfig {
    /// Migration run settings
    pub migration: MigrationSettings,

    /// Backoff and retry configuration for remote API calls
    pub retry: RetryConfig,

    /// Substitution rules for unusable user references
    pub users: UserRemapConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Upper bound on in-flight create calls for one object type
    pub max_concurrent_submissions: usize,
    /// Row limit applied to objects whose manifest entry sets none
    pub default_row_limit: Option<u32>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            max_concurrent_submissions: 8,
            default_row_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per remote call, including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub jitter_enabled: bool,
    /// Maximum jitter as a fraction of the computed delay (0.0 to 1.0)
    pub max_jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter_enabled: true,
            max_jitter: 0.1,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// What to write in place of a user reference that cannot be targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSubstitution {
    /// Use the configured fallback user, or the destination's current user
    FallbackUser,
    /// Leave the field empty
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UserRemapConfig {
    /// Destination user receiving records owned by missing or inactive users.
    /// When unset, the destination client's current user is used.
    pub fallback_user_id: Option<String>,
    pub missing_users: UserSubstitution,
    pub inactive_users: UserSubstitution,
}

impl Default for UserRemapConfig {
    fn default() -> Self {
        Self {
            fallback_user_id: None,
            missing_users: UserSubstitution::FallbackUser,
            inactive_users: UserSubstitution::FallbackUser,
        }
    }
}

impl SandboxberryConfig {
    /// Validate value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.migration.max_concurrent_submissions == 0 {
            return Err(ConfigurationError::invalid_value(
                "migration.max_concurrent_submissions",
                self.migration.max_concurrent_submissions,
                "must be at least 1",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                self.retry.max_attempts,
                "must be at least 1 (the first attempt counts)",
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "retry.multiplier",
                self.retry.multiplier,
                "must be a finite number >= 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.max_jitter) {
            return Err(ConfigurationError::invalid_value(
                "retry.max_jitter",
                self.retry.max_jitter,
                "must be between 0.0 and 1.0",
            ));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigurationError::invalid_value(
                "retry.max_delay_ms",
                self.retry.max_delay_ms,
                "must not be smaller than retry.base_delay_ms",
            ));
        }
        if let Some(fallback) = &self.users.fallback_user_id {
            if fallback.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    "users.fallback_user_id",
                    fallback,
                    "must not be blank; omit it to use the current user",
                ));
            }
        }
        Ok(())
    }
}
