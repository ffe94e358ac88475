// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simple config to cluster config pipeline.
//!
//! `SimpleConfig` is k3d's user-facing config file format (`kind: Simple`).
//! Turning it into something runnable takes four pure steps:
//! [`process_simple_config`], [`transform_simple_to_cluster_config`],
//! [`process_cluster_config`] and [`validate_cluster_config`].

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{
    context_name, Cluster, ClusterNetwork, ExposureOpts, Node, NodeRole, PortBinding, PortMap,
    ServerOpts, DEFAULT_API_PORT, LABEL_CLUSTER, LABEL_NETWORK, LABEL_NETWORK_EXTERNAL, LABEL_ROLE,
    LABEL_SERVER_API_HOST, LABEL_SERVER_API_HOST_IP, LABEL_SERVER_API_PORT,
};

pub const SIMPLE_CONFIG_API_VERSION: &str = "k3d.io/v1alpha5";
pub const SIMPLE_CONFIG_KIND: &str = "Simple";

/// Repository used when the image is given as a bare channel tag.
pub const DEFAULT_K3S_IMAGE_REPO: &str = "docker.io/rancher/k3s";
pub const DEFAULT_LB_IMAGE: &str = "ghcr.io/k3d-io/k3d-proxy:5.6.0";

/// Image channels that expand to `DEFAULT_K3S_IMAGE_REPO:<channel>`.
const IMAGE_CHANNELS: &[&str] = &["latest", "stable"];

/// Docker network name that switches nodes to host networking.
pub const HOST_NETWORK: &str = "host";

/// Cluster names end up in container host names with prefixes and suffixes.
pub const MAX_CLUSTER_NAME_LEN: usize = 32;

/// Upper bound on servers and on agents in one cluster.
pub const MAX_NODES_PER_ROLE: i64 = 99;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigTransformError {
    #[error("Invalid cluster name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Cluster must have at least one server node")]
    NoServers,

    #[error("Invalid {role} count {count}: must not be negative")]
    NegativeCount { role: &'static str, count: i64 },

    #[error("Invalid {role} count {count}: at most {max} allowed")]
    TooManyNodes { role: &'static str, count: i64, max: i64 },

    #[error("Invalid Kubernetes API host port '{0}'")]
    InvalidPort(String),

    #[error("Invalid Kubernetes API host IP '{0}'")]
    InvalidHostIp(String),

    #[error("No node image specified")]
    EmptyImage,

    #[error("Duplicate node name '{0}'")]
    DuplicateNode(String),

    #[error("Only a single server can run in host network mode")]
    HostNetworkMultiServer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
}

/// Kubernetes API exposure in the simple config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleExposureOpts {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(rename = "hostIP", default, skip_serializing_if = "String::is_empty")]
    pub host_ip: String,
    #[serde(rename = "hostPort", default, skip_serializing_if = "String::is_empty")]
    pub host_port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleConfigOptionsK3d {
    #[serde(default)]
    pub wait: bool,
    #[serde(default, with = "duration_secs")]
    pub timeout: Duration,
    #[serde(default)]
    pub disable_loadbalancer: bool,
}

impl Default for SimpleConfigOptionsK3d {
    fn default() -> Self {
        Self {
            wait: true,
            timeout: Duration::from_secs(90),
            disable_loadbalancer: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleConfigOptionsKubeconfig {
    #[serde(default)]
    pub update_default_kubeconfig: bool,
    #[serde(default)]
    pub switch_current_context: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleConfigOptions {
    #[serde(default)]
    pub k3d: SimpleConfigOptionsK3d,
    #[serde(default)]
    pub kubeconfig: SimpleConfigOptionsKubeconfig,
}

/// k3d `kind: Simple` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleConfig {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub servers: i64,
    #[serde(default)]
    pub agents: i64,
    #[serde(rename = "kubeAPI", default)]
    pub expose_api: SimpleExposureOpts,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(default)]
    pub options: SimpleConfigOptions,
}

impl SimpleConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: SIMPLE_CONFIG_API_VERSION.to_string(),
            kind: SIMPLE_CONFIG_KIND.to_string(),
            metadata: ObjectMeta { name: name.into() },
            servers: 1,
            agents: 0,
            expose_api: SimpleExposureOpts::default(),
            image: IMAGE_CHANNELS[0].to_string(),
            network: String::new(),
            options: SimpleConfigOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Cluster creation options carried alongside the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCreateOpts {
    pub wait: bool,
    pub timeout: Duration,
    pub disable_load_balancer: bool,
}

/// A fully expanded cluster ready for `cluster_run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub cluster: Cluster,
    pub create_opts: ClusterCreateOpts,
    pub kubeconfig_opts: SimpleConfigOptionsKubeconfig,
    /// The processed simple config this was derived from.
    pub source: SimpleConfig,
}

/// Normalize a simple config in place: expand image channels, and disable the
/// load balancer under host networking.
pub fn process_simple_config(simple: &mut SimpleConfig) -> Result<(), ConfigTransformError> {
    if IMAGE_CHANNELS.contains(&simple.image.as_str()) {
        simple.image = format!("{}:{}", DEFAULT_K3S_IMAGE_REPO, simple.image);
    }
    if simple.network == HOST_NETWORK {
        simple.options.k3d.disable_loadbalancer = true;
    }
    Ok(())
}

fn node_name(cluster: &str, suffix: &str) -> String {
    format!("{}-{}", context_name(cluster), suffix)
}

fn labelled_node(cluster: &str, name: String, role: NodeRole, image: &str, network: &str) -> Node {
    let mut runtime_labels = BTreeMap::new();
    runtime_labels.insert(LABEL_CLUSTER.to_string(), cluster.to_string());
    runtime_labels.insert(LABEL_ROLE.to_string(), role.as_str().to_string());
    Node {
        name,
        role,
        image: image.to_string(),
        runtime_labels,
        networks: vec![network.to_string()],
        ..Default::default()
    }
}

fn check_node_count(role: &'static str, count: i64) -> Result<(), ConfigTransformError> {
    if count > MAX_NODES_PER_ROLE {
        return Err(ConfigTransformError::TooManyNodes {
            role,
            count,
            max: MAX_NODES_PER_ROLE,
        });
    }
    Ok(())
}

/// Expand a simple config into a cluster with one node per container.
///
/// Node counts are bounded before any node is built.
pub fn transform_simple_to_cluster_config(
    simple: &SimpleConfig,
) -> Result<ClusterConfig, ConfigTransformError> {
    let name = simple.name();
    if name.is_empty() {
        return Err(ConfigTransformError::InvalidName {
            name: String::new(),
            reason: "name must not be empty",
        });
    }

    let network = if simple.network.is_empty() {
        ClusterNetwork {
            name: context_name(name),
            external: false,
        }
    } else {
        ClusterNetwork {
            name: simple.network.clone(),
            external: true,
        }
    };

    let kube_api = ExposureOpts {
        host: simple.expose_api.host.clone(),
        port: format!("{}/tcp", DEFAULT_API_PORT),
        binding: PortBinding::new(
            simple.expose_api.host_ip.clone(),
            simple.expose_api.host_port.clone(),
        ),
    };

    check_node_count("server", simple.servers)?;
    check_node_count("agent", simple.agents)?;

    let mut nodes = Vec::new();
    for i in 0..simple.servers.max(0) {
        nodes.push(labelled_node(
            name,
            node_name(name, &format!("server-{}", i)),
            NodeRole::Server,
            &simple.image,
            &network.name,
        ));
    }
    for i in 0..simple.agents.max(0) {
        nodes.push(labelled_node(
            name,
            node_name(name, &format!("agent-{}", i)),
            NodeRole::Agent,
            &simple.image,
            &network.name,
        ));
    }

    let mut api_ports = PortMap::new();
    api_ports.insert(kube_api.port.clone(), vec![kube_api.binding.clone()]);

    let disable_lb = simple.options.k3d.disable_loadbalancer;
    if !disable_lb && simple.servers > 0 {
        let mut lb = labelled_node(
            name,
            node_name(name, "serverlb"),
            NodeRole::LoadBalancer,
            DEFAULT_LB_IMAGE,
            &network.name,
        );
        lb.ports = api_ports;
        nodes.push(lb);
    } else if let Some(first) = nodes.iter_mut().find(|n| n.role == NodeRole::Server) {
        first.ports = api_ports;
    }

    Ok(ClusterConfig {
        cluster: Cluster {
            name: name.to_string(),
            network,
            nodes,
            kube_api: Some(kube_api),
        },
        create_opts: ClusterCreateOpts {
            wait: simple.options.k3d.wait,
            timeout: simple.options.k3d.timeout,
            disable_load_balancer: disable_lb,
        },
        kubeconfig_opts: simple.options.kubeconfig,
        source: simple.clone(),
    })
}

/// Finish the cluster: mark the init server of a multi-server cluster and
/// propagate network and API settings into node labels.
pub fn process_cluster_config(
    mut config: ClusterConfig,
) -> Result<ClusterConfig, ConfigTransformError> {
    let cluster = &mut config.cluster;
    let multi_server = cluster.servers().count() > 1;
    let kube_api = cluster.kube_api.clone();
    let network = cluster.network.clone();

    let mut first_server = true;
    for node in cluster.nodes.iter_mut() {
        node.runtime_labels
            .insert(LABEL_NETWORK.to_string(), network.name.clone());
        if network.external {
            node.runtime_labels
                .insert(LABEL_NETWORK_EXTERNAL.to_string(), "true".to_string());
        }
        if node.role != NodeRole::Server {
            continue;
        }

        node.server_opts = ServerOpts {
            is_init: multi_server && first_server,
            kube_api: kube_api.clone(),
        };
        first_server = false;

        if let Some(api) = &kube_api {
            if !api.host.is_empty() {
                node.runtime_labels
                    .insert(LABEL_SERVER_API_HOST.to_string(), api.host.clone());
            }
            node.runtime_labels
                .insert(LABEL_SERVER_API_HOST_IP.to_string(), api.binding.host_ip.clone());
            node.runtime_labels
                .insert(LABEL_SERVER_API_PORT.to_string(), api.binding.host_port.clone());
        }
    }

    Ok(config)
}

pub fn validate_cluster_name(name: &str) -> Result<(), ConfigTransformError> {
    let invalid = |reason| {
        Err(ConfigTransformError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("name must not be empty");
    }
    if name.len() > MAX_CLUSTER_NAME_LEN {
        return invalid("name must be at most 32 characters");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return invalid("only letters, digits and '-' are allowed");
    }
    if name.starts_with('-') || name.ends_with('-') {
        return invalid("name must start and end with a letter or digit");
    }
    Ok(())
}

/// Reject configurations k3d would fail on.
pub fn validate_cluster_config(config: &ClusterConfig) -> Result<(), ConfigTransformError> {
    validate_cluster_name(&config.cluster.name)?;

    let source = &config.source;
    if source.servers < 0 {
        return Err(ConfigTransformError::NegativeCount {
            role: "server",
            count: source.servers,
        });
    }
    if source.agents < 0 {
        return Err(ConfigTransformError::NegativeCount {
            role: "agent",
            count: source.agents,
        });
    }
    check_node_count("server", source.servers)?;
    check_node_count("agent", source.agents)?;

    let servers = config.cluster.servers().count();
    if servers == 0 {
        return Err(ConfigTransformError::NoServers);
    }
    if config.cluster.network.name == HOST_NETWORK && servers > 1 {
        return Err(ConfigTransformError::HostNetworkMultiServer);
    }

    let mut seen = HashSet::new();
    for node in &config.cluster.nodes {
        if node.image.is_empty() {
            return Err(ConfigTransformError::EmptyImage);
        }
        if !seen.insert(node.name.as_str()) {
            return Err(ConfigTransformError::DuplicateNode(node.name.clone()));
        }
    }

    if let Some(api) = &config.cluster.kube_api {
        let port = &api.binding.host_port;
        if !port.is_empty() && !matches!(port.parse::<u16>(), Ok(p) if p > 0) {
            return Err(ConfigTransformError::InvalidPort(port.clone()));
        }
        let ip = &api.binding.host_ip;
        if !ip.is_empty() && ip.parse::<IpAddr>().is_err() {
            return Err(ConfigTransformError::InvalidHostIp(ip.clone()));
        }
    }

    Ok(())
}

/// Run the whole pipeline on a simple config.
pub fn build_cluster_config(mut simple: SimpleConfig) -> Result<ClusterConfig, ConfigTransformError> {
    process_simple_config(&mut simple)?;
    let config = transform_simple_to_cluster_config(&simple)?;
    let config = process_cluster_config(config)?;
    validate_cluster_config(&config)?;
    Ok(config)
}

/// `Duration` as k3d writes it in config files (`90s`).
mod duration_secs {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}s", value.as_secs()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        let (digits, scale) = if let Some(m) = trimmed.strip_suffix('m') {
            (m, 60)
        } else {
            (trimmed.strip_suffix('s').unwrap_or(trimmed), 1)
        };
        digits
            .parse::<u64>()
            .map(|n| Duration::from_secs(n * scale))
            .map_err(|_| D::Error::custom(format!("invalid duration '{}'", raw)))
    }
}

#[cfg(test)]
#[path = "config_transform_tests.rs"]
mod tests;
