//! Engine configuration.
//!
//! Loaded from an optional JSON file; anything missing falls back to the
//! defaults below.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, provider::DEFAULT_PROVIDER};

/// Settings for a [`BookingEngine`](crate::engine::BookingEngine)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Provider attached by `assign` when no custom selector is installed
    pub default_provider: String,
    /// Register the built-in logging observers
    pub builtin_observers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { default_provider: DEFAULT_PROVIDER.to_string(), builtin_observers: true }
    }
}

impl EngineConfig {
    /// Read a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replace the default provider
    #[must_use]
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = provider.into();
        self
    }

    /// Enable or disable the built-in observers
    #[must_use]
    pub fn with_builtin_observers(mut self, enabled: bool) -> Self {
        self.builtin_observers = enabled;
        self
    }
}
