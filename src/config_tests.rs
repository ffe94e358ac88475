// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

use super::*;
use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = ProviderConfig::load_with(env_from(&[])).unwrap();
    assert_eq!(config, ProviderConfig::default());
    assert_eq!(config.backend, BackendKind::Cli);
    assert_eq!(config.create_timeout(), Duration::from_secs(90));
    assert!(config.wait);
}

#[test]
fn test_env_overrides() {
    let config = ProviderConfig::load_with(env_from(&[
        (ENV_BACKEND, "memory"),
        (ENV_K3D_BINARY, "/opt/bin/k3d"),
        (ENV_CONFIG_DIR, "/tmp/k3d"),
        (ENV_CREATE_TIMEOUT, "120"),
        (ENV_LOG_FORMAT, "json"),
        (ENV_LOG_LEVEL, "debug"),
    ]))
    .unwrap();

    assert_eq!(config.backend, BackendKind::Memory);
    assert_eq!(config.k3d_binary, PathBuf::from("/opt/bin/k3d"));
    assert_eq!(config.config_dir, Some(PathBuf::from("/tmp/k3d")));
    assert_eq!(config.create_timeout_secs, 120);
    assert_eq!(config.log.format, LogFormat::Json);
    assert_eq!(config.log.level, "debug");
}

#[test]
fn test_invalid_env_values() {
    let err = ProviderConfig::load_with(env_from(&[(ENV_BACKEND, "docker")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: ENV_BACKEND, .. }));

    let err = ProviderConfig::load_with(env_from(&[(ENV_CREATE_TIMEOUT, "soon")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: ENV_CREATE_TIMEOUT, .. }));

    let err = ProviderConfig::load_with(env_from(&[(ENV_CREATE_TIMEOUT, "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_empty_env_values_ignored() {
    let config = ProviderConfig::load_with(env_from(&[(ENV_BACKEND, "  ")])).unwrap();
    assert_eq!(config.backend, BackendKind::Cli);
}

#[test]
fn test_toml_file_then_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("provider.toml");
    std::fs::write(
        &path,
        "backend = \"memory\"\ncreate_timeout_secs = 30\n\n[log]\nformat = \"json\"\n",
    )
    .unwrap();

    let path_str = path.to_string_lossy().into_owned();
    let config = ProviderConfig::load_with(env_from(&[
        (ENV_CONFIG_FILE, path_str.as_str()),
        (ENV_CREATE_TIMEOUT, "45"),
    ]))
    .unwrap();

    assert_eq!(config.backend, BackendKind::Memory);
    assert_eq!(config.create_timeout_secs, 45);
    assert_eq!(config.log.format, LogFormat::Json);
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_missing_config_file() {
    let err = ProviderConfig::load_with(env_from(&[(ENV_CONFIG_FILE, "/nonexistent/provider.toml")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_toml_round_trip() {
    let config = ProviderConfig {
        config_dir: Some(PathBuf::from("/var/lib/k3d")),
        ..Default::default()
    };
    let rendered = config.to_toml().unwrap();
    assert!(!rendered.contains("kubeconfig_path"));
    assert_eq!(ProviderConfig::from_toml(&rendered).unwrap(), config);
}

#[test]
fn test_resolve_config_dir_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("k3d");
    let config = ProviderConfig {
        config_dir: Some(target.clone()),
        ..Default::default()
    };
    assert_eq!(config.resolve_config_dir().unwrap(), target);
    assert!(target.is_dir());
}
