// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

use super::*;

fn cluster_kubeconfig(name: &str, server: &str) -> Kubeconfig {
    let raw = format!(
        r#"
apiVersion: v1
kind: Config
clusters:
- name: k3d-{name}
  cluster:
    server: {server}
    certificate-authority-data: Q0E=
contexts:
- name: k3d-{name}
  context:
    cluster: k3d-{name}
    user: admin@k3d-{name}
users:
- name: admin@k3d-{name}
  user:
    client-certificate-data: Q0VSVA==
current-context: k3d-{name}
"#
    );
    Kubeconfig::parse(&raw).unwrap()
}

#[test]
fn test_parse_keeps_unknown_fields() {
    let raw = "apiVersion: v1\nkind: Config\npreferences: {}\nclusters: []\n";
    let config = Kubeconfig::parse(raw).unwrap();
    assert!(config.extra.contains_key("preferences"));
    assert!(config.to_yaml().unwrap().contains("preferences"));
}

#[test]
fn test_parse_empty_file() {
    let config = Kubeconfig::parse("   \n").unwrap();
    assert_eq!(config, Kubeconfig::default());
}

#[test]
fn test_merge_adds_entries() {
    let mut base = cluster_kubeconfig("dev", "https://127.0.0.1:6550");
    base.merge(cluster_kubeconfig("prod", "https://127.0.0.1:6551"), false)
        .unwrap();
    assert_eq!(base.clusters.len(), 2);
    assert_eq!(base.users.len(), 2);
    assert!(base.has_context("k3d-prod"));
}

#[test]
fn test_merge_conflict_without_overwrite() {
    let mut base = cluster_kubeconfig("dev", "https://127.0.0.1:6550");
    let err = base
        .merge(cluster_kubeconfig("dev", "https://127.0.0.1:7000"), false)
        .unwrap_err();
    assert!(matches!(err, KubeconfigError::Conflict { kind: "clusters", .. }));

    base.merge(cluster_kubeconfig("dev", "https://127.0.0.1:7000"), true)
        .unwrap();
    assert_eq!(base.clusters.len(), 1);
}

#[test]
fn test_merge_identical_is_noop() {
    let mut base = cluster_kubeconfig("dev", "https://127.0.0.1:6550");
    base.merge(cluster_kubeconfig("dev", "https://127.0.0.1:6550"), false)
        .unwrap();
    assert_eq!(base, cluster_kubeconfig("dev", "https://127.0.0.1:6550"));
}

#[test]
fn test_remove_cluster_leaves_others() {
    let mut config = cluster_kubeconfig("dev", "https://127.0.0.1:6550");
    config
        .merge(cluster_kubeconfig("other", "https://127.0.0.1:6551"), false)
        .unwrap();

    assert!(config.remove_cluster("dev"));
    assert_eq!(config.clusters.len(), 1);
    assert_eq!(config.clusters[0].name, "k3d-other");
    assert_eq!(config.users[0].name, "admin@k3d-other");
    assert_eq!(config.contexts[0].name, "k3d-other");
    assert_eq!(config.current_context, "");

    assert!(!config.remove_cluster("dev"));
}

#[test]
fn test_write_merges_into_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");
    cluster_kubeconfig("other", "https://127.0.0.1:6551")
        .write_atomic(&path)
        .unwrap();

    write_kubeconfig(
        cluster_kubeconfig("dev", "https://127.0.0.1:6550"),
        &path,
        WriteKubeconfigOptions::default(),
    )
    .unwrap();

    let written = Kubeconfig::load(&path).unwrap().unwrap();
    assert!(written.has_context("k3d-dev"));
    assert!(written.has_context("k3d-other"));
    assert_eq!(written.current_context, "k3d-other");
}

#[test]
fn test_write_switches_context_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");
    cluster_kubeconfig("other", "https://127.0.0.1:6551")
        .write_atomic(&path)
        .unwrap();

    let opts = WriteKubeconfigOptions {
        update_current_context: true,
        ..Default::default()
    };
    write_kubeconfig(cluster_kubeconfig("dev", "https://127.0.0.1:6550"), &path, opts).unwrap();
    assert_eq!(Kubeconfig::load(&path).unwrap().unwrap().current_context, "k3d-dev");
}

#[test]
fn test_write_refuses_existing_without_update() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kubeconfig-dev.yaml");
    cluster_kubeconfig("dev", "https://127.0.0.1:6550")
        .write_atomic(&path)
        .unwrap();

    let opts = WriteKubeconfigOptions {
        update_existing: false,
        overwrite_existing: false,
        update_current_context: false,
    };
    let err = write_kubeconfig(cluster_kubeconfig("dev", "https://127.0.0.1:6550"), &path, opts)
        .unwrap_err();
    assert!(matches!(err, KubeconfigError::AlreadyExists(_)));
}

#[test]
fn test_write_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("k3d").join("kubeconfig-dev.yaml");
    write_kubeconfig(
        cluster_kubeconfig("dev", "https://127.0.0.1:6550"),
        &path,
        WriteKubeconfigOptions::default(),
    )
    .unwrap();
    assert!(path.exists());
}

#[test]
fn test_remove_from_missing_file_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    remove_cluster_from_file(&dir.path().join("absent"), "dev").unwrap();
}

#[test]
fn test_remove_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");
    cluster_kubeconfig("dev", "https://127.0.0.1:6550")
        .write_atomic(&path)
        .unwrap();

    remove_cluster_from_file(&path, "dev").unwrap();
    let config = Kubeconfig::load(&path).unwrap().unwrap();
    assert!(config.clusters.is_empty());
    assert!(config.users.is_empty());
    assert!(config.contexts.is_empty());
}
