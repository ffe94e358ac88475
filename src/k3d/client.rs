// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! The narrow k3d surface the provider depends on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::config_transform::{ClusterConfig, ConfigTransformError};
use super::kubeconfig::KubeconfigError;
use super::types::{Cluster, ClusterDeleteOpts, Node, WriteKubeconfigOptions};
use crate::context::OpContext;

/// Errors from k3d operations.
#[derive(Error, Debug)]
pub enum K3dError {
    /// The cluster has no nodes, i.e. does not exist.
    #[error("No nodes found for given cluster")]
    NoNodesFound,

    #[error("Failed to run `{command}`: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Failed to parse k3d output: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Kubeconfig error: {0}")]
    Kubeconfig(#[from] KubeconfigError),

    #[error("Invalid cluster configuration: {0}")]
    Config(#[from] ConfigTransformError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Runtime(String),
}

impl K3dError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, K3dError::NoNodesFound)
    }
}

/// Operations the provider performs against k3d.
///
/// Every call takes the operation context so a host `stop` can interrupt it.
#[async_trait]
pub trait K3dClient: Send + Sync {
    /// Look up a cluster by name. Absent clusters yield
    /// [`K3dError::NoNodesFound`].
    async fn cluster_get(&self, ctx: &OpContext, name: &str) -> Result<Cluster, K3dError>;

    /// Create and start every node of a processed cluster config.
    async fn cluster_run(&self, ctx: &OpContext, config: &ClusterConfig) -> Result<(), K3dError>;

    async fn cluster_delete(
        &self,
        ctx: &OpContext,
        cluster: &Cluster,
        opts: ClusterDeleteOpts,
    ) -> Result<(), K3dError>;

    /// Every k3d node known to the runtime, across all clusters.
    async fn node_list(&self, ctx: &OpContext) -> Result<Vec<Node>, K3dError>;

    /// Fetch the cluster's kubeconfig and write it to `output`, or to the
    /// default kubeconfig when `output` is `None`. Returns the written path.
    async fn kubeconfig_get_write(
        &self,
        ctx: &OpContext,
        cluster: &Cluster,
        output: Option<&Path>,
        opts: WriteKubeconfigOptions,
    ) -> Result<PathBuf, K3dError>;

    /// Drop the cluster, context and user entries of `cluster` from the
    /// default kubeconfig.
    async fn kubeconfig_remove_cluster_from_default(
        &self,
        ctx: &OpContext,
        cluster: &Cluster,
    ) -> Result<(), K3dError>;
}
