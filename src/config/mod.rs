//! Configuration schema, loading and validation.
//!
//! The configuration is a single TOML file. Every section is optional and a
//! missing file yields the defaults.

mod error;
mod general;
mod loading;
mod paths;
mod profile;
mod session;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

pub use error::ConfigError;
pub use general::{GeneralConfig, LogLevel};
pub use paths::ConfigPaths;
pub use profile::ProfileConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use session::SessionConfig;

/// Main configuration structure for mpris-pilot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct Config {
    /// Program-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Connection sequence timing.
    #[serde(default)]
    pub session: SessionConfig,

    /// Launch profiles keyed by name; these win over the built-in ones.
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl Config {
    /// Check every section for values the client cannot work with.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidConfigField` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        for (name, profile) in &self.profiles {
            profile.validate(name)?;
        }
        Ok(())
    }

    /// JSON schema of the configuration file, pretty-printed.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be serialized.
    pub fn schema_json() -> Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(Config);
        serde_json::to_string_pretty(&schema)
    }
}
