// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! `k3d_nodes` data source: the containers of one cluster.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{debug, trace};

use super::{encode_state, DataSource};
use crate::context::OpContext;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Outcome};
use crate::k3d::types::container_port_number;
use crate::k3d::{K3dClient, Node};
use crate::schema::{Attribute, AttributeType, Schema};
use crate::value::AttrValue;
use crate::ProviderError;

pub const NODES_TYPE_NAME: &str = "k3d_nodes";

/// One flattened port binding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRecord {
    pub port: i64,
    pub host_ip: String,
    pub host_port: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub role: String,
    pub ports: BTreeSet<PortRecord>,
    pub runtime_labels: BTreeMap<String, String>,
    pub node_labels: BTreeMap<String, String>,
    pub networks: Vec<String>,
    pub ip: String,
}

impl NodeRecord {
    /// Project a k3d node. Bindings whose container or host port is not a
    /// valid port number are dropped.
    pub fn from_node(node: &Node) -> Self {
        let mut ports = BTreeSet::new();
        for (key, bindings) in &node.ports {
            let Some(port) = container_port_number(key) else {
                trace!(node = %node.name, port = %key, "Skipping unparsable container port");
                continue;
            };
            for binding in bindings {
                match binding.host_port.parse::<u16>() {
                    Ok(host_port) => {
                        ports.insert(PortRecord {
                            port: i64::from(port),
                            host_ip: binding.host_ip.clone(),
                            host_port: i64::from(host_port),
                        });
                    }
                    Err(_) => {
                        trace!(node = %node.name, host_port = %binding.host_port, "Skipping unparsable host port")
                    }
                }
            }
        }

        Self {
            name: node.name.clone(),
            role: node.role.to_string(),
            ports,
            runtime_labels: node.runtime_labels.clone(),
            node_labels: node.k3s_node_labels.clone(),
            networks: node.networks.clone(),
            ip: node.ip.ip.clone(),
        }
    }
}

/// Data source configuration; computed attributes are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NodesConfig {
    cluster_name: AttrValue<String>,
}

/// State of a `k3d_nodes` read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesData {
    pub cluster_name: String,
    pub id: String,
    pub nodes: BTreeMap<String, NodeRecord>,
}

impl NodesData {
    /// Keep the nodes labelled as members of `cluster_name`.
    pub fn collect(cluster_name: &str, nodes: &[Node]) -> Self {
        let nodes = nodes
            .iter()
            .filter(|node| node.belongs_to(cluster_name))
            .map(|node| (node.name.clone(), NodeRecord::from_node(node)))
            .collect();
        Self {
            cluster_name: cluster_name.to_string(),
            id: cluster_name.to_string(),
            nodes,
        }
    }
}

pub fn nodes_schema() -> Schema {
    let port_binding = AttributeType::object([
        ("port", AttributeType::Int64),
        ("host_ip", AttributeType::String),
        ("host_port", AttributeType::Int64),
    ]);

    let node = BTreeMap::from([
        (
            "name".to_string(),
            Attribute::new(AttributeType::String)
                .computed()
                .describe("The name of the nodes docker container"),
        ),
        (
            "role".to_string(),
            Attribute::new(AttributeType::String)
                .computed()
                .describe("The K3d cluster role of the node"),
        ),
        (
            "ports".to_string(),
            Attribute::new(AttributeType::set(port_binding))
                .computed()
                .describe("Node port binding set"),
        ),
        (
            "runtime_labels".to_string(),
            Attribute::new(AttributeType::map(AttributeType::String))
                .computed()
                .describe("A map of runtime labels to their values"),
        ),
        (
            "node_labels".to_string(),
            Attribute::new(AttributeType::map(AttributeType::String))
                .computed()
                .describe("A map of K3s node labels to their values"),
        ),
        (
            "networks".to_string(),
            Attribute::new(AttributeType::list(AttributeType::String))
                .computed()
                .describe("The list of docker networks to which the node is attached"),
        ),
        (
            "ip".to_string(),
            Attribute::new(AttributeType::String)
                .computed()
                .describe("The IP address of the node's container"),
        ),
    ]);

    Schema::new("K3d Cluster Node Listing Data Source")
        .attribute(
            "cluster_name",
            Attribute::new(AttributeType::String)
                .required()
                .describe("Name of the K3D cluster for which to retrieve node information"),
        )
        .attribute(
            "id",
            Attribute::new(AttributeType::String)
                .computed()
                .describe("Unique cluster identifier"),
        )
        .attribute(
            "nodes",
            Attribute::map_nested(node)
                .computed()
                .describe("Map of node names to node information"),
        )
}

pub struct NodesDataSource {
    k3d: Arc<dyn K3dClient>,
}

impl NodesDataSource {
    pub fn new(k3d: Arc<dyn K3dClient>) -> Self {
        Self { k3d }
    }
}

#[async_trait]
impl DataSource for NodesDataSource {
    fn type_name(&self) -> &'static str {
        NODES_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        nodes_schema()
    }

    async fn read(&self, ctx: &OpContext, config: &Json) -> Outcome<Json> {
        let config = match NodesConfig::deserialize(config) {
            Ok(config) => config,
            Err(e) => {
                return Outcome::failed(ProviderError::decode("nodes config", e).to_diagnostic().into())
            }
        };
        let Some(cluster_name) = config.cluster_name.into_known() else {
            return Outcome::failed(
                Diagnostic::error("Missing cluster name", "cluster_name must be known to list nodes")
                    .with_code(DiagnosticCode::ValidationFailure)
                    .into(),
            );
        };

        debug!(cluster = %cluster_name, "Reading list of existing K3d nodes");
        let nodes = match self.k3d.node_list(ctx).await {
            Ok(nodes) => nodes,
            Err(e) => {
                return Outcome::failed(
                    Diagnostic::error("Failed to list K3d nodes", e.to_string())
                        .with_code(DiagnosticCode::ExternalOperationFailure)
                        .into(),
                )
            }
        };

        let data = NodesData::collect(&cluster_name, &nodes);
        debug!(cluster = %cluster_name, nodes = data.nodes.len(), "Listed cluster nodes");
        encode_state("nodes state", &data)
    }
}

#[cfg(test)]
#[path = "nodes_tests.rs"]
mod tests;
