use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verbosity of log output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only show errors.
    Error,

    /// Warnings and errors.
    Warn,

    /// Session progress, warnings and errors.
    #[default]
    Info,

    /// Per-property and per-poll detail.
    Debug,

    /// Everything, including zbus internals.
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

impl LogLevel {
    /// Filter directive for this level that keeps zbus's own chatter at
    /// `warn` unless tracing everything.
    pub fn directive(self) -> String {
        match self {
            LogLevel::Trace => "trace".to_string(),
            level => format!("{level},zbus=warn"),
        }
    }
}
