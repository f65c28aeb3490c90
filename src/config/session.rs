use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Timing of the connection sequence and of forwarded calls.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// How long to wait for the player's bus name to appear, in milliseconds.
    pub discovery_timeout_ms: u64,

    /// Delay between two name registry queries, in milliseconds.
    pub poll_interval_ms: u64,

    /// Timeout applied to every remote method call and property access, in
    /// milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: 30_000,
            poll_interval_ms: 100,
            call_timeout_ms: 30_000,
        }
    }
}

impl SessionConfig {
    /// Discovery window.
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    /// Name registry polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Remote call timeout.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("session.discovery_timeout_ms", self.discovery_timeout_ms),
            ("session.poll_interval_ms", self.poll_interval_ms),
            ("session.call_timeout_ms", self.call_timeout_ms),
        ];

        for (field, value) in fields {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }

        Ok(())
    }
}
