//! Unit tests for config module
//!
//! Tests configuration types, defaults, parsing and validation.
//! No filesystem dependencies - all in-memory.

#![allow(clippy::panic)]

use std::time::Duration;

use crate::config::{Config, ConfigError, LogLevel, SessionConfig};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.session.discovery_timeout(), Duration::from_secs(30));
    assert_eq!(config.session.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.session.call_timeout(), Duration::from_secs(30));
    assert_eq!(config.general.log_level, LogLevel::Info);
    assert!(config.profiles.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn config_empty_toml_is_default() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"

        [session]
        poll_interval_ms = 250

        [profiles.mpv]
        command = "mpv"
        args = ["--idle"]
    "#;

    let config = Config::from_toml_str(toml_str).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.session.poll_interval_ms, 250);
    assert_eq!(
        config.session.discovery_timeout_ms,
        SessionConfig::default().discovery_timeout_ms
    );

    let mpv = &config.profiles["mpv"];
    assert_eq!(mpv.command, "mpv");
    assert_eq!(mpv.args, vec!["--idle".to_string()]);
    assert!(mpv.process_name.is_none());
}

#[test]
fn config_serialize_roundtrip() {
    let original = Config::from_toml_str(
        r#"
        [profiles.mpv]
        command = "mpv"
        process_name = "mpv"
    "#,
    )
    .unwrap();

    let toml_str = toml::to_string(&original).unwrap();
    let deserialized: Config = toml::from_str(&toml_str).unwrap();

    assert_eq!(original, deserialized);
}

#[test]
fn zero_poll_interval_is_rejected() {
    let err = Config::from_toml_str("[session]\npoll_interval_ms = 0").unwrap_err();

    match err {
        ConfigError::InvalidConfigField { field, .. } => {
            assert_eq!(field, "session.poll_interval_ms");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_timeouts_are_rejected() {
    assert!(Config::from_toml_str("[session]\ndiscovery_timeout_ms = 0").is_err());
    assert!(Config::from_toml_str("[session]\ncall_timeout_ms = 0").is_err());
}

#[test]
fn empty_profile_command_is_rejected() {
    let err = Config::from_toml_str("[profiles.broken]\ncommand = \"  \"").unwrap_err();

    assert!(err.to_string().contains("profiles.broken.command"));
}

#[test]
fn invalid_toml_reports_parse_error() {
    let err = Config::from_toml_str("[session\n").unwrap_err();
    assert!(matches!(err, ConfigError::TomlParseError { .. }));
}

#[test]
fn log_level_directive_quiets_zbus() {
    assert_eq!(LogLevel::Info.directive(), "info,zbus=warn");
    assert_eq!(LogLevel::Trace.directive(), "trace");
}

#[test]
fn schema_names_all_sections() {
    let schema = Config::schema_json().unwrap();

    assert!(schema.contains("session"));
    assert!(schema.contains("profiles"));
    assert!(schema.contains("poll_interval_ms"));
}
