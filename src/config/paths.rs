use std::{env, fs, path::PathBuf};

use super::ConfigError;

const APP_NAME: &str = "mpris-pilot";

/// Locations of the configuration file and log directory.
///
/// Follows the XDG Base Directory layout.
pub struct ConfigPaths;

impl ConfigPaths {
    /// `$XDG_CONFIG_HOME/mpris-pilot`, falling back to `$HOME/.config/mpris-pilot`.
    ///
    /// # Errors
    /// Returns `ConfigError::NoConfigDir` if neither variable is set.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let config_home = env::var("XDG_CONFIG_HOME")
            .or_else(|_| env::var("HOME").map(|home| format!("{home}/.config")))
            .map_err(|_| ConfigError::NoConfigDir)?;

        Ok(PathBuf::from(config_home).join(APP_NAME))
    }

    /// Path of the main configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError::NoConfigDir` if no config directory can be determined.
    pub fn main_config() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// `$HOME/.mpris-pilot/logs`, created if missing.
    ///
    /// # Errors
    /// Returns an error if `HOME` is unset or the directory cannot be created.
    pub fn log_dir() -> Result<PathBuf, ConfigError> {
        let home = env::var("HOME").map_err(|_| ConfigError::NoConfigDir)?;
        let log_dir = PathBuf::from(home).join(format!(".{APP_NAME}")).join("logs");

        if !log_dir.exists() {
            fs::create_dir_all(&log_dir).map_err(|e| ConfigError::io(&e, &log_dir))?;
        }

        Ok(log_dir)
    }
}
