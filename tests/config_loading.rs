//! Integration tests for loading the configuration file from disk.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

use std::fs;

use mpris_pilot::{
    config::{Config, ConfigError, ConfigPaths, LogLevel},
    services::mpris::PlayerProfile,
};
use tempfile::TempDir;

fn write_config(temp_dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

mod loading {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();

        let config = Config::load(&temp.path().join("absent.toml")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_all_sections() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
[general]
log_level = "warn"

[session]
discovery_timeout_ms = 5000
poll_interval_ms = 50
call_timeout_ms = 2000

[profiles.mpv]
command = "mpv"
args = ["--idle", "--force-window"]
process_name = "mpv"
"#,
        );

        let config = Config::load(&path).unwrap();

        assert_eq!(config.general.log_level, LogLevel::Warn);
        assert_eq!(config.session.discovery_timeout_ms, 5000);
        assert_eq!(config.session.poll_interval_ms, 50);
        assert_eq!(config.session.call_timeout_ms, 2000);

        let mpv = PlayerProfile::lookup("mpv", &config.profiles).unwrap();
        assert_eq!(mpv.resolve(None).to_string(), "mpv --idle --force-window");
    }

    #[test]
    fn invalid_values_are_rejected_with_field_name() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[session]\ncall_timeout_ms = 0\n");

        let err = Config::load(&path).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidConfigField { ref field, .. } if field == "session.call_timeout_ms"
        ));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[profiles.vlc\ncommand = 1\n");

        let err = Config::load(&path).unwrap_err();

        match err {
            ConfigError::TomlParseError { location, .. } => {
                assert!(location.ends_with("config.toml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        let temp = TempDir::new().unwrap();

        let err = Config::load(temp.path()).unwrap_err();

        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}

mod paths {
    use super::*;

    #[test]
    fn config_file_lives_under_xdg_config_home() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("mpris-pilot");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            "[session]\npoll_interval_ms = 250\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp.path());
        }

        assert_eq!(ConfigPaths::main_config().unwrap(), config_dir.join("config.toml"));
        assert_eq!(Config::load_default().unwrap().session.poll_interval_ms, 250);
    }
}
