use std::{fs, io::ErrorKind, path::Path};

use tracing::{debug, info};

use super::{Config, ConfigError, ConfigPaths};

impl Config {
    /// Load and validate the configuration at `path`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The TOML content is invalid
    /// - A value fails validation
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(ConfigError::io(&e, path)),
        };

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::toml_parse(e, Some(path)))?;
        config.validate()?;

        info!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
        Ok(config)
    }

    /// Load the configuration from its XDG location.
    ///
    /// # Errors
    /// Returns an error if the location cannot be determined or the file is
    /// invalid.
    pub fn load_default() -> Result<Config, ConfigError> {
        Self::load(&ConfigPaths::main_config()?)
    }

    /// Parse and validate configuration held in memory.
    ///
    /// # Errors
    /// Returns an error if the TOML is invalid or a value fails validation.
    pub fn from_toml_str(content: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::toml_parse(e, None))?;
        config.validate()?;
        Ok(config)
    }
}
