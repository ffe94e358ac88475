// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-process k3d simulation.
//!
//! Backs the `memory` backend and the test suites. Clusters live in a map,
//! kubeconfigs are merged into a file when one is configured and into an
//! in-memory document otherwise. Individual operations can be made to fail.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_yaml::{Mapping, Value as Yaml};
use tracing::debug;

use super::client::{K3dClient, K3dError};
use super::config_transform::ClusterConfig;
use super::kubeconfig::{self, ContextRef, Kubeconfig, NamedContext, NamedEntry};
use super::types::{Cluster, ClusterDeleteOpts, Node, NodeState, WriteKubeconfigOptions};
use crate::context::OpContext;

/// Operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ClusterGet,
    ClusterRun,
    ClusterDelete,
    NodeList,
    KubeconfigWrite,
    KubeconfigRemove,
}

#[derive(Debug, Default)]
struct MemoryState {
    clusters: BTreeMap<String, Cluster>,
    /// Nodes not belonging to any managed cluster.
    loose_nodes: Vec<Node>,
    failures: HashSet<FailPoint>,
    default_kubeconfig: Kubeconfig,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryK3d {
    state: Mutex<MemoryState>,
    default_kubeconfig_path: Option<PathBuf>,
}

/// Kubeconfig a real k3d would hand out for `cluster`.
pub fn synthetic_kubeconfig(cluster: &Cluster) -> Kubeconfig {
    let context = cluster.context_name();
    let user = kubeconfig::user_name(&cluster.name);
    let (host, port) = match &cluster.kube_api {
        Some(api) => {
            let host = if !api.host.is_empty() {
                api.host.clone()
            } else if !api.binding.host_ip.is_empty() {
                api.binding.host_ip.clone()
            } else {
                "0.0.0.0".to_string()
            };
            (host, api.binding.host_port.clone())
        }
        None => ("0.0.0.0".to_string(), String::new()),
    };

    let mut server = Mapping::new();
    server.insert(
        Yaml::from("server"),
        Yaml::from(format!("https://{}:{}", host, port)),
    );
    let mut user_body = Mapping::new();
    user_body.insert(Yaml::from("token"), Yaml::from(format!("{}-token", cluster.name)));

    Kubeconfig {
        clusters: vec![NamedEntry {
            name: context.clone(),
            body: BTreeMap::from([("cluster".to_string(), Yaml::Mapping(server))]),
        }],
        contexts: vec![NamedContext {
            name: context.clone(),
            context: ContextRef {
                cluster: context.clone(),
                user: user.clone(),
                extra: BTreeMap::new(),
            },
        }],
        users: vec![NamedEntry {
            name: user,
            body: BTreeMap::from([("user".to_string(), Yaml::Mapping(user_body))]),
        }],
        current_context: context,
        ..Kubeconfig::default()
    }
}

impl InMemoryK3d {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge default kubeconfig writes into a real file.
    pub fn with_default_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_kubeconfig_path = Some(path.into());
        self
    }

    /// Register an existing cluster as-is.
    pub fn insert_cluster(&self, cluster: Cluster) {
        self.state.lock().clusters.insert(cluster.name.clone(), cluster);
    }

    /// Register a node outside any managed cluster.
    pub fn insert_node(&self, node: Node) {
        self.state.lock().loose_nodes.push(node);
    }

    pub fn fail(&self, point: FailPoint) {
        self.state.lock().failures.insert(point);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    pub fn cluster(&self, name: &str) -> Option<Cluster> {
        self.state.lock().clusters.get(name).cloned()
    }

    pub fn cluster_names(&self) -> Vec<String> {
        self.state.lock().clusters.keys().cloned().collect()
    }

    /// In-memory default kubeconfig (unused when a file is configured).
    pub fn default_kubeconfig(&self) -> Kubeconfig {
        self.state.lock().default_kubeconfig.clone()
    }

    /// Every call made so far, as `operation argument` strings.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn called(&self, operation: &str) -> bool {
        self.state
            .lock()
            .calls
            .iter()
            .any(|c| c.split_whitespace().next() == Some(operation))
    }

    fn enter(&self, ctx: &OpContext, call: String, point: FailPoint) -> Result<(), K3dError> {
        let mut state = self.state.lock();
        debug!(call = %call, "In-memory k3d call");
        state.calls.push(call.clone());
        if ctx.is_cancelled() {
            return Err(K3dError::Cancelled);
        }
        if state.failures.contains(&point) {
            return Err(K3dError::Runtime(format!("injected failure in {}", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl K3dClient for InMemoryK3d {
    async fn cluster_get(&self, ctx: &OpContext, name: &str) -> Result<Cluster, K3dError> {
        self.enter(ctx, format!("cluster_get {}", name), FailPoint::ClusterGet)?;
        match self.state.lock().clusters.get(name) {
            Some(cluster) if !cluster.nodes.is_empty() => Ok(cluster.clone()),
            _ => Err(K3dError::NoNodesFound),
        }
    }

    async fn cluster_run(&self, ctx: &OpContext, config: &ClusterConfig) -> Result<(), K3dError> {
        let name = &config.cluster.name;
        self.enter(ctx, format!("cluster_run {}", name), FailPoint::ClusterRun)?;

        let mut state = self.state.lock();
        if state.clusters.contains_key(name) {
            return Err(K3dError::Runtime(format!("cluster '{}' already exists", name)));
        }
        let mut cluster = config.cluster.clone();
        for node in cluster.nodes.iter_mut() {
            node.state = NodeState {
                running: true,
                status: "running".to_string(),
            };
        }
        state.clusters.insert(name.clone(), cluster);
        Ok(())
    }

    async fn cluster_delete(
        &self,
        ctx: &OpContext,
        cluster: &Cluster,
        opts: ClusterDeleteOpts,
    ) -> Result<(), K3dError> {
        self.enter(
            ctx,
            format!(
                "cluster_delete {} skip_registry_check={}",
                cluster.name, opts.skip_registry_check
            ),
            FailPoint::ClusterDelete,
        )?;
        self.state.lock().clusters.remove(&cluster.name);
        Ok(())
    }

    async fn node_list(&self, ctx: &OpContext) -> Result<Vec<Node>, K3dError> {
        self.enter(ctx, "node_list".to_string(), FailPoint::NodeList)?;
        let state = self.state.lock();
        Ok(state
            .clusters
            .values()
            .flat_map(|c| c.nodes.iter().cloned())
            .chain(state.loose_nodes.iter().cloned())
            .collect())
    }

    async fn kubeconfig_get_write(
        &self,
        ctx: &OpContext,
        cluster: &Cluster,
        output: Option<&Path>,
        opts: WriteKubeconfigOptions,
    ) -> Result<PathBuf, K3dError> {
        self.enter(
            ctx,
            format!("kubeconfig_get_write {}", cluster.name),
            FailPoint::KubeconfigWrite,
        )?;
        let incoming = synthetic_kubeconfig(cluster);

        match output.map(Path::to_path_buf).or_else(|| self.default_kubeconfig_path.clone()) {
            Some(path) => {
                kubeconfig::write_kubeconfig(incoming, &path, opts)?;
                Ok(path)
            }
            None => {
                let mut state = self.state.lock();
                state
                    .default_kubeconfig
                    .merge(incoming, opts.overwrite_existing)?;
                Ok(PathBuf::new())
            }
        }
    }

    async fn kubeconfig_remove_cluster_from_default(
        &self,
        ctx: &OpContext,
        cluster: &Cluster,
    ) -> Result<(), K3dError> {
        self.enter(
            ctx,
            format!("kubeconfig_remove {}", cluster.name),
            FailPoint::KubeconfigRemove,
        )?;
        match &self.default_kubeconfig_path {
            Some(path) => kubeconfig::remove_cluster_from_file(path, &cluster.name)?,
            None => {
                self.state.lock().default_kubeconfig.remove_cluster(&cluster.name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
