//! # Conductor Configuration System
//!
//! Configuration management for the orchestration core. Values come from
//! explicit defaults, an optional environment-specific config file, and
//! `CONDUCTOR_*` environment variable overrides, in that order.
//!
//! ## Usage
//!
//! ```rust
//! use conductor_core::config::ConductorConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConductorConfig::load()?;
//! assert!(config.bus.default_timeout_ms > 0);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConductorError, Result};

/// Root configuration structure for the orchestration core
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConductorConfig {
    /// Lifecycle phase execution settings
    pub execution: ExecutionConfig,

    /// Communication bus settings
    pub bus: BusConfig,

    /// Event publishing settings
    pub events: EventConfig,
}

/// Lifecycle phase execution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// Run components within a dependency level concurrently
    pub parallel_startup: bool,
    /// Keep driving remaining components after one fails
    pub continue_on_failure: bool,
    /// Upper bound for a single component phase operation, in milliseconds
    pub phase_timeout_ms: u64,
}

/// Communication bus configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusConfig {
    /// Default wait for `send_and_wait` when the caller gives no timeout,
    /// in milliseconds
    pub default_timeout_ms: u64,
}

/// Event publisher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventConfig {
    /// Broadcast channel capacity for orchestrator events
    pub channel_capacity: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel_startup: true,
            continue_on_failure: false,
            phase_timeout_ms: 30_000,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 5_000,
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            execution: ExecutionConfig::default(),
            bus: BusConfig::default(),
            events: EventConfig::default(),
        }
    }
}

impl ConductorConfig {
    /// Load configuration for the auto-detected environment.
    ///
    /// Layering: built-in defaults, then `config/conductor.{env}.toml` when
    /// present, then `CONDUCTOR_*` environment variables
    /// (e.g. `CONDUCTOR_BUS__DEFAULT_TIMEOUT_MS=2000`).
    pub fn load() -> Result<Self> {
        Self::load_for_environment(&detect_environment())
    }

    /// Load configuration for an explicit environment name
    pub fn load_for_environment(environment: &str) -> Result<Self> {
        let defaults = Self::default();

        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&defaults).map_err(|e| {
                ConductorError::ConfigurationError(format!("Invalid defaults: {e}"))
            })?)
            .add_source(
                config::File::with_name(&format!("config/conductor.{environment}"))
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("CONDUCTOR").separator("__"));

        let loaded: Self = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| {
                ConductorError::ConfigurationError(format!(
                    "Failed to load configuration for environment '{environment}': {e}"
                ))
            })?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate loaded values before they reach the orchestrator
    pub fn validate(&self) -> Result<()> {
        if self.execution.phase_timeout_ms == 0 {
            return Err(ConductorError::ConfigurationError(
                "execution.phase_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.bus.default_timeout_ms == 0 {
            return Err(ConductorError::ConfigurationError(
                "bus.default_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConductorError::ConfigurationError(
                "events.channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Phase timeout as a `Duration`
    pub fn phase_timeout(&self) -> Duration {
        Duration::from_millis(self.execution.phase_timeout_ms)
    }

    /// Default bus request timeout as a `Duration`
    pub fn bus_timeout(&self) -> Duration {
        Duration::from_millis(self.bus.default_timeout_ms)
    }
}

/// Detect the current environment from environment variables
pub fn detect_environment() -> String {
    std::env::var("CONDUCTOR_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConductorConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.execution.parallel_startup);
        assert!(!config.execution.continue_on_failure);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ConductorConfig::default();
        config.bus.default_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_helpers() {
        let config = ConductorConfig::default();
        assert_eq!(config.bus_timeout(), Duration::from_millis(5_000));
        assert_eq!(config.phase_timeout(), Duration::from_millis(30_000));
    }
}
