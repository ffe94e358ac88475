// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! k3d domain types.
//!
//! Field names follow k3d's JSON output (`k3d cluster list -o json`,
//! `k3d node list -o json`) so the same structs decode CLI output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Runtime label naming the cluster a node belongs to.
pub const LABEL_CLUSTER: &str = "k3d.cluster";
/// Runtime label carrying the node role.
pub const LABEL_ROLE: &str = "k3d.role";
/// Runtime label carrying the cluster network name.
pub const LABEL_NETWORK: &str = "k3d.cluster.network";
/// Runtime label set when the network was not created by k3d.
pub const LABEL_NETWORK_EXTERNAL: &str = "k3d.cluster.network.external";
pub const LABEL_SERVER_API_HOST: &str = "k3d.server.api.host";
pub const LABEL_SERVER_API_HOST_IP: &str = "k3d.server.api.hostIP";
pub const LABEL_SERVER_API_PORT: &str = "k3d.server.api.port";

/// Prefix k3d puts in front of cluster-derived names.
pub const K3D_PREFIX: &str = "k3d";

/// Node role within a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeRole {
    #[serde(rename = "server")]
    Server,
    #[serde(rename = "agent")]
    Agent,
    #[serde(rename = "loadbalancer")]
    LoadBalancer,
    #[serde(rename = "registry")]
    Registry,
    #[serde(rename = "noRole", other)]
    NoRole,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Server => "server",
            NodeRole::Agent => "agent",
            NodeRole::LoadBalancer => "loadbalancer",
            NodeRole::Registry => "registry",
            NodeRole::NoRole => "noRole",
        }
    }
}

impl Default for NodeRole {
    fn default() -> Self {
        NodeRole::NoRole
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Host side of a port mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortBinding {
    #[serde(rename = "HostIp", default)]
    pub host_ip: String,
    #[serde(rename = "HostPort", default)]
    pub host_port: String,
}

impl PortBinding {
    pub fn new(host_ip: impl Into<String>, host_port: impl Into<String>) -> Self {
        Self {
            host_ip: host_ip.into(),
            host_port: host_port.into(),
        }
    }
}

/// Container port (e.g. `6443/tcp`) to host bindings.
pub type PortMap = BTreeMap<String, Vec<PortBinding>>;

/// Parse the numeric part of a container port key such as `6443/tcp`.
pub fn container_port_number(key: &str) -> Option<u16> {
    key.split('/').next().and_then(|p| p.parse().ok())
}

/// Kubernetes API exposure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureOpts {
    #[serde(default)]
    pub host: String,
    #[serde(rename = "Port", default)]
    pub port: String,
    #[serde(rename = "Binding", default)]
    pub binding: PortBinding,
}

/// Server-specific node options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOpts {
    #[serde(rename = "isInit", default)]
    pub is_init: bool,
    #[serde(rename = "kubeAPI", default, skip_serializing_if = "Option::is_none")]
    pub kube_api: Option<ExposureOpts>,
}

/// Address of a node inside the cluster network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIp {
    #[serde(rename = "IP", default)]
    pub ip: String,
    #[serde(rename = "Static", default)]
    pub is_static: bool,
}

/// Container state as reported by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    #[serde(rename = "Running", default)]
    pub running: bool,
    #[serde(rename = "Status", default)]
    pub status: String,
}

/// A single k3d node (one container).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: NodeRole,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "portMappings", default)]
    pub ports: PortMap,
    #[serde(rename = "runtimeLabels", default)]
    pub runtime_labels: BTreeMap<String, String>,
    #[serde(rename = "k3sNodeLabels", default)]
    pub k3s_node_labels: BTreeMap<String, String>,
    #[serde(rename = "Networks", default)]
    pub networks: Vec<String>,
    #[serde(rename = "IP", default)]
    pub ip: NodeIp,
    #[serde(rename = "serverOpts", default)]
    pub server_opts: ServerOpts,
    #[serde(rename = "State", default)]
    pub state: NodeState,
}

impl Node {
    /// Cluster name from the runtime labels, if labelled.
    pub fn cluster_label(&self) -> Option<&str> {
        self.runtime_labels.get(LABEL_CLUSTER).map(String::as_str)
    }

    pub fn belongs_to(&self, cluster_name: &str) -> bool {
        self.cluster_label() == Some(cluster_name)
    }
}

/// Network the cluster nodes are attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNetwork {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "isExternal", default)]
    pub external: bool,
}

/// A k3d cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    #[serde(default)]
    pub network: ClusterNetwork,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(rename = "kubeAPI", default, skip_serializing_if = "Option::is_none")]
    pub kube_api: Option<ExposureOpts>,
}

impl Cluster {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn servers(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.role == NodeRole::Server)
    }

    /// Fill network and API exposure from node labels where the listing left
    /// them empty.
    pub fn populate_from_labels(&mut self) {
        if self.network.name.is_empty() {
            if let Some(network) = self
                .nodes
                .iter()
                .find_map(|n| n.runtime_labels.get(LABEL_NETWORK))
            {
                self.network.name = network.clone();
            }
            self.network.external = self.nodes.iter().any(|n| {
                n.runtime_labels
                    .get(LABEL_NETWORK_EXTERNAL)
                    .is_some_and(|v| v == "true")
            });
        }

        if self.kube_api.is_none() {
            let api = self.servers().find_map(|server| {
                if let Some(api) = &server.server_opts.kube_api {
                    return Some(api.clone());
                }
                let labels = &server.runtime_labels;
                let port = labels.get(LABEL_SERVER_API_PORT)?;
                Some(ExposureOpts {
                    host: labels.get(LABEL_SERVER_API_HOST).cloned().unwrap_or_default(),
                    port: format!("{}/tcp", DEFAULT_API_PORT),
                    binding: PortBinding::new(
                        labels.get(LABEL_SERVER_API_HOST_IP).cloned().unwrap_or_default(),
                        port.clone(),
                    ),
                })
            });
            self.kube_api = api;
        }
    }

    /// Name of the kubeconfig context, cluster and user entries.
    pub fn context_name(&self) -> String {
        context_name(&self.name)
    }
}

/// Container-side Kubernetes API port.
pub const DEFAULT_API_PORT: &str = "6443";

/// Kubeconfig context name k3d uses for a cluster.
pub fn context_name(cluster_name: &str) -> String {
    format!("{}-{}", K3D_PREFIX, cluster_name)
}

/// Options for deleting a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterDeleteOpts {
    pub skip_registry_check: bool,
}

/// Options for writing a kubeconfig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteKubeconfigOptions {
    /// Merge into an existing file instead of replacing it.
    pub update_existing: bool,
    /// Replace an existing file without merging.
    pub overwrite_existing: bool,
    /// Point `current-context` at the new cluster.
    pub update_current_context: bool,
}

impl Default for WriteKubeconfigOptions {
    fn default() -> Self {
        Self {
            update_existing: true,
            overwrite_existing: false,
            update_current_context: false,
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
