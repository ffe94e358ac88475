// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! `K3dClient` backed by the k3d command line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::client::{K3dClient, K3dError};
use super::command::{CommandLine, CommandOutput, CommandRunner, TokioCommandRunner};
use super::config_transform::ClusterConfig;
use super::kubeconfig::{self, Kubeconfig};
use super::types::{Cluster, ClusterDeleteOpts, Node, WriteKubeconfigOptions};
use crate::context::OpContext;

pub const DEFAULT_K3D_BINARY: &str = "k3d";

/// Drives k3d through its CLI. Kubeconfig merging happens in-process.
pub struct CliK3dClient {
    binary: PathBuf,
    runner: Arc<dyn CommandRunner>,
    default_kubeconfig: Option<PathBuf>,
}

impl CliK3dClient {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self::with_runner(binary, Arc::new(TokioCommandRunner))
    }

    pub fn with_runner(binary: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            binary: binary.into(),
            runner,
            default_kubeconfig: None,
        }
    }

    /// Use `path` instead of `$KUBECONFIG` / `~/.kube/config`.
    pub fn with_default_kubeconfig(mut self, path: Option<PathBuf>) -> Self {
        self.default_kubeconfig = path;
        self
    }

    fn default_kubeconfig(&self) -> Result<PathBuf, K3dError> {
        match &self.default_kubeconfig {
            Some(path) => Ok(path.clone()),
            None => Ok(kubeconfig::default_kubeconfig_path()?),
        }
    }

    fn command(&self) -> CommandLine {
        CommandLine::new(&self.binary)
    }

    /// Run and turn a non-zero exit into [`K3dError::CommandFailed`].
    async fn run_checked(
        &self,
        ctx: &OpContext,
        command: CommandLine,
    ) -> Result<CommandOutput, K3dError> {
        let output = self.runner.run(ctx, &command).await?;
        if !output.success {
            let message = match output.stderr.trim() {
                "" => output.stdout.trim().to_string(),
                stderr => stderr.to_string(),
            };
            return Err(K3dError::CommandFailed {
                command: command.to_string(),
                message,
            });
        }
        Ok(output)
    }

    async fn list_clusters(&self, ctx: &OpContext) -> Result<Vec<Cluster>, K3dError> {
        let output = self
            .run_checked(ctx, self.command().args(["cluster", "list", "-o", "json"]))
            .await?;
        parse_json(&output.stdout)
    }
}

fn parse_json<T: serde::de::DeserializeOwned + Default>(raw: &str) -> Result<T, K3dError> {
    // k3d prints `null` for empty lists on some versions.
    match raw.trim() {
        "" | "null" => Ok(T::default()),
        body => serde_json::from_str(body).map_err(|e| K3dError::Parse(e.to_string())),
    }
}

#[async_trait]
impl K3dClient for CliK3dClient {
    async fn cluster_get(&self, ctx: &OpContext, name: &str) -> Result<Cluster, K3dError> {
        let mut cluster = self
            .list_clusters(ctx)
            .await?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or(K3dError::NoNodesFound)?;
        if cluster.nodes.is_empty() {
            return Err(K3dError::NoNodesFound);
        }
        cluster.populate_from_labels();
        Ok(cluster)
    }

    async fn cluster_run(&self, ctx: &OpContext, config: &ClusterConfig) -> Result<(), K3dError> {
        let yaml = config
            .source
            .to_yaml()
            .map_err(|e| K3dError::Runtime(format!("Failed to render k3d config: {}", e)))?;

        // Kept alive until the command returns.
        let mut file = tempfile::Builder::new()
            .prefix("k3d-config-")
            .suffix(".yaml")
            .tempfile()?;
        file.write_all(yaml.as_bytes())?;
        file.flush()?;

        let mut command = self
            .command()
            .args(["cluster", "create", "--config"])
            .arg(file.path())
            .arg(format!("--timeout={}s", config.create_opts.timeout.as_secs()));
        if config.create_opts.wait {
            command = command.arg("--wait");
        }

        info!(cluster = %config.cluster.name, "Creating cluster via k3d CLI");
        self.run_checked(ctx, command).await?;
        Ok(())
    }

    async fn cluster_delete(
        &self,
        ctx: &OpContext,
        cluster: &Cluster,
        opts: ClusterDeleteOpts,
    ) -> Result<(), K3dError> {
        debug!(
            cluster = %cluster.name,
            skip_registry_check = opts.skip_registry_check,
            "Deleting cluster via k3d CLI"
        );
        self.run_checked(
            ctx,
            self.command().args(["cluster", "delete"]).arg(&cluster.name),
        )
        .await?;
        Ok(())
    }

    async fn node_list(&self, ctx: &OpContext) -> Result<Vec<Node>, K3dError> {
        let output = self
            .run_checked(ctx, self.command().args(["node", "list", "-o", "json"]))
            .await?;
        parse_json(&output.stdout)
    }

    async fn kubeconfig_get_write(
        &self,
        ctx: &OpContext,
        cluster: &Cluster,
        output: Option<&Path>,
        opts: WriteKubeconfigOptions,
    ) -> Result<PathBuf, K3dError> {
        let fetched = self
            .run_checked(
                ctx,
                self.command().args(["kubeconfig", "get"]).arg(&cluster.name),
            )
            .await?;
        let config = Kubeconfig::parse(&fetched.stdout)?;

        let path = match output {
            Some(path) => path.to_path_buf(),
            None => self.default_kubeconfig()?,
        };
        kubeconfig::write_kubeconfig(config, &path, opts)?;
        debug!(cluster = %cluster.name, path = %path.display(), "Wrote kubeconfig");
        Ok(path)
    }

    async fn kubeconfig_remove_cluster_from_default(
        &self,
        _ctx: &OpContext,
        cluster: &Cluster,
    ) -> Result<(), K3dError> {
        let path = self.default_kubeconfig()?;
        kubeconfig::remove_cluster_from_file(&path, &cluster.name)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "cli_client_tests.rs"]
mod tests;
