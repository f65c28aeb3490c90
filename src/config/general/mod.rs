mod log_level;

pub use log_level::LogLevel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings that apply to the whole program rather than one player.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct GeneralConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default)]
    pub log_level: LogLevel,
}
