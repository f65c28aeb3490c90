use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// A user-defined launch profile, added to or replacing a built-in one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProfileConfig {
    /// Executable to spawn.
    pub command: String,

    /// Arguments passed before the ones given on the command line.
    #[serde(default)]
    pub args: Vec<String>,

    /// Name matched by `killall` when stopping. Defaults to `command`.
    #[serde(default)]
    pub process_name: Option<String>,
}

impl ProfileConfig {
    pub(crate) fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.command.trim().is_empty() {
            return Err(ConfigError::invalid(
                format!("profiles.{name}.command"),
                "must not be empty",
            ));
        }

        if self.process_name.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::invalid(
                format!("profiles.{name}.process_name"),
                "must not be empty when set",
            ));
        }

        Ok(())
    }
}
