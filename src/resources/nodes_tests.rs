// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::k3d::types::LABEL_CLUSTER;
use crate::k3d::{FailPoint, InMemoryK3d, NodeRole, PortBinding};
use serde_json::json;

fn node(cluster: Option<&str>, name: &str, role: NodeRole) -> Node {
    let mut node = Node {
        name: name.to_string(),
        role,
        networks: vec!["k3d-test".to_string()],
        ..Default::default()
    };
    node.ip.ip = "172.18.0.2".to_string();
    if let Some(cluster) = cluster {
        node.runtime_labels
            .insert(LABEL_CLUSTER.to_string(), cluster.to_string());
    }
    node
}

fn data_source(nodes: Vec<Node>) -> (Arc<InMemoryK3d>, NodesDataSource) {
    let k3d = Arc::new(InMemoryK3d::new());
    for n in nodes {
        k3d.insert_node(n);
    }
    let ds = NodesDataSource::new(k3d.clone());
    (k3d, ds)
}

#[test]
fn test_record_flattens_ports() {
    let mut n = node(Some("test"), "k3d-test-serverlb", NodeRole::LoadBalancer);
    n.ports.insert(
        "6443/tcp".to_string(),
        vec![PortBinding::new("0.0.0.0", "6550"), PortBinding::new("::", "6550")],
    );
    n.ports
        .insert("80/tcp".to_string(), vec![PortBinding::new("0.0.0.0", "8080")]);

    let record = NodeRecord::from_node(&n);
    assert_eq!(record.role, "loadbalancer");
    assert_eq!(record.ports.len(), 3);
    assert!(record.ports.contains(&PortRecord {
        port: 80,
        host_ip: "0.0.0.0".into(),
        host_port: 8080,
    }));
    assert!(record.ports.contains(&PortRecord {
        port: 6443,
        host_ip: "::".into(),
        host_port: 6550,
    }));
}

#[test]
fn test_record_skips_unparsable_host_port() {
    let mut n = node(Some("test"), "k3d-test-server-0", NodeRole::Server);
    n.ports.insert(
        "6443/tcp".to_string(),
        vec![
            PortBinding::new("0.0.0.0", "random"),
            PortBinding::new("0.0.0.0", "70000"),
            PortBinding::new("0.0.0.0", "6443"),
        ],
    );

    let record = NodeRecord::from_node(&n);
    assert_eq!(record.ports.len(), 1);
    assert_eq!(record.ports.iter().next().unwrap().host_port, 6443);
}

#[test]
fn test_record_dedups_ports() {
    let mut n = node(Some("test"), "k3d-test-server-0", NodeRole::Server);
    n.ports.insert(
        "6443/tcp".to_string(),
        vec![PortBinding::new("0.0.0.0", "6443"), PortBinding::new("0.0.0.0", "6443")],
    );
    assert_eq!(NodeRecord::from_node(&n).ports.len(), 1);
}

#[test]
fn test_collect_filters_by_cluster_label() {
    let nodes = vec![
        node(Some("test"), "k3d-test-server-0", NodeRole::Server),
        node(Some("test"), "k3d-test-agent-0", NodeRole::Agent),
        node(Some("other"), "k3d-other-server-0", NodeRole::Server),
        node(None, "registry", NodeRole::Registry),
    ];

    let data = NodesData::collect("test", &nodes);
    assert_eq!(data.id, "test");
    assert_eq!(
        data.nodes.keys().collect::<Vec<_>>(),
        vec!["k3d-test-agent-0", "k3d-test-server-0"]
    );
}

#[tokio::test]
async fn test_read_returns_cluster_nodes() {
    let mut server = node(Some("test"), "k3d-test-server-0", NodeRole::Server);
    server
        .k3s_node_labels
        .insert("topology".to_string(), "a".to_string());
    let (_, ds) = data_source(vec![
        server,
        node(Some("other"), "k3d-other-server-0", NodeRole::Server),
    ]);

    let outcome = ds.read(&OpContext::new(), &json!({ "cluster_name": "test" })).await;
    assert!(outcome.is_success());
    let state = outcome.value().unwrap();

    assert_eq!(state["cluster_name"], json!("test"));
    assert_eq!(state["id"], json!("test"));
    let nodes = state["nodes"].as_object().unwrap();
    assert_eq!(nodes.len(), 1);
    let server = &nodes["k3d-test-server-0"];
    assert_eq!(server["role"], json!("server"));
    assert_eq!(server["networks"], json!(["k3d-test"]));
    assert_eq!(server["ip"], json!("172.18.0.2"));
    assert_eq!(server["node_labels"]["topology"], json!("a"));
    assert_eq!(server["runtime_labels"][LABEL_CLUSTER], json!("test"));
    assert_eq!(server["ports"], json!([]));
}

#[tokio::test]
async fn test_read_unknown_cluster_is_empty() {
    let (_, ds) = data_source(vec![node(Some("other"), "k3d-other-server-0", NodeRole::Server)]);
    let outcome = ds.read(&OpContext::new(), &json!({ "cluster_name": "test" })).await;
    assert_eq!(outcome.value().unwrap()["nodes"], json!({}));
}

#[tokio::test]
async fn test_read_listing_failure() {
    let (k3d, ds) = data_source(Vec::new());
    k3d.fail(FailPoint::NodeList);

    let outcome = ds.read(&OpContext::new(), &json!({ "cluster_name": "test" })).await;
    assert!(!outcome.is_success());
    assert_eq!(
        outcome.diagnostics.errors().next().unwrap().summary,
        "Failed to list K3d nodes"
    );
}

#[tokio::test]
async fn test_read_requires_known_cluster_name() {
    let (k3d, ds) = data_source(Vec::new());
    let outcome = ds
        .read(&OpContext::new(), &json!({ "cluster_name": crate::value::unknown_json() }))
        .await;
    assert!(outcome.diagnostics.has_code(DiagnosticCode::ValidationFailure));
    assert!(!k3d.called("node_list"));
}

#[test]
fn test_schema_shape() {
    let schema = nodes_schema();
    assert!(schema.get("cluster_name").unwrap().required);
    assert!(schema.get("id").unwrap().computed);
    let nodes = schema.get("nodes").unwrap();
    assert!(nodes.computed);
    assert!(nodes.nested.as_ref().unwrap().contains_key("ports"));
}
