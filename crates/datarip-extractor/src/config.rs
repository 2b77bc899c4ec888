//! Configuration for the Extractor

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default name of the forced extraction tool
pub const DEFAULT_FUNCTION_NAME: &str = "extraction_function";

/// Default description of the forced extraction tool
pub const DEFAULT_FUNCTION_DESCRIPTION: &str = "Extract data as per the schema provided";

/// Configuration for compiling schemas and driving extraction jobs
///
/// # Examples
///
/// ```
/// use datarip_extractor::ExtractorConfig;
///
/// let config = ExtractorConfig::from_toml(r#"
///     tick_interval_ms = 250
///     step_timeout_secs = 0
/// "#).unwrap();
/// assert_eq!(config.tick_interval_ms, 250);
/// assert!(config.step_timeout().is_none());
/// assert_eq!(config.function_name, "extraction_function");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Interval between ticks of the worker (milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Upper bound on one tick, including the provider call (seconds, 0 = unbounded)
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Name of the forced extraction tool
    #[serde(default = "default_function_name")]
    pub function_name: String,

    /// Description of the forced extraction tool
    #[serde(default = "default_function_description")]
    pub function_description: String,
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_step_timeout_secs() -> u64 {
    120
}

fn default_function_name() -> String {
    DEFAULT_FUNCTION_NAME.to_string()
}

fn default_function_description() -> String {
    DEFAULT_FUNCTION_DESCRIPTION.to_string()
}

impl ExtractorConfig {
    /// Get the tick interval as a Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Get the per-tick bound, if any
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.tick_interval_ms == 0 {
            return Err(ExtractorError::Config(
                "tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.function_name.trim().is_empty() {
            return Err(ExtractorError::Config(
                "function_name must not be empty".to_string(),
            ));
        }
        if !self
            .function_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ExtractorError::Config(format!(
                "function_name '{}' may only contain letters, digits, '_' and '-'",
                self.function_name
            )));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            step_timeout_secs: default_step_timeout_secs(),
            function_name: default_function_name(),
            function_description: default_function_description(),
        }
    }
}
