// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! `k3d_cluster` lifecycle.
//!
//! Create builds a k3d config from the plan, runs the cluster, writes
//! kubeconfigs and reads the result back. Every attribute forces
//! replacement, so Update is never valid. Delete tears the cluster down and
//! removes both kubeconfig artifacts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as Json;
use tracing::{debug, info, trace, warn};

use super::cluster_types::{cluster_schema, ClusterData, CLUSTER_TYPE_NAME};
use super::{encode_state, Resource};
use crate::config::ProviderConfig;
use crate::context::OpContext;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Outcome};
use crate::k3d::config_transform::{
    process_cluster_config, process_simple_config, transform_simple_to_cluster_config,
    validate_cluster_config, ClusterConfig, ConfigTransformError,
};
use crate::k3d::{ClusterDeleteOpts, K3dClient, K3dError, NodeRole, WriteKubeconfigOptions};
use crate::schema::Schema;
use crate::value::AttrValue;
use crate::ProviderError;

/// Options for both kubeconfig writes on create.
const KUBECONFIG_WRITE: WriteKubeconfigOptions = WriteKubeconfigOptions {
    update_existing: true,
    overwrite_existing: false,
    update_current_context: false,
};

/// Standalone kubeconfig of a cluster inside the k3d config directory.
pub fn standalone_kubeconfig_path(config_dir: &Path, name: &str) -> PathBuf {
    config_dir.join(format!("kubeconfig-{}.yaml", name))
}

pub struct ClusterResource {
    k3d: Arc<dyn K3dClient>,
    config: Arc<ProviderConfig>,
}

impl ClusterResource {
    pub fn new(k3d: Arc<dyn K3dClient>, config: Arc<ProviderConfig>) -> Self {
        Self { k3d, config }
    }

    fn build_config(&self, name: &str, data: &ClusterData) -> Result<ClusterConfig, ConfigTransformError> {
        let mut simple = data.simple_config(name, &self.config);
        process_simple_config(&mut simple)?;
        trace!(cluster = %name, image = %simple.image, "Processed simple config");

        let config = transform_simple_to_cluster_config(&simple)?;
        trace!(cluster = %name, nodes = config.cluster.nodes.len(), "Transformed to cluster config");

        let config = process_cluster_config(config)?;
        trace!(cluster = %name, "Processed cluster config");

        validate_cluster_config(&config)?;
        trace!(cluster = %name, "Validated cluster config");
        Ok(config)
    }

    async fn write_kubeconfigs(&self, ctx: &OpContext, config: &ClusterConfig, diags: &mut Diagnostics) {
        let cluster = &config.cluster;
        if let Err(e) = self
            .k3d
            .kubeconfig_get_write(ctx, cluster, None, KUBECONFIG_WRITE)
            .await
        {
            warn!(cluster = %cluster.name, error = %e, "Failed to update default kubeconfig");
            diags.push(
                Diagnostic::warning("Failed to update default kubeconfig", e.to_string())
                    .with_code(DiagnosticCode::SideEffectFailure),
            );
        }

        let path = match self
            .config
            .resolve_config_dir()
            .map(|dir| standalone_kubeconfig_path(&dir, &cluster.name))
        {
            Ok(path) => path,
            Err(e) => {
                diags.push(
                    Diagnostic::warning("Failed to write cluster kubeconfig", e.to_string())
                        .with_code(DiagnosticCode::SideEffectFailure),
                );
                return;
            }
        };
        if let Err(e) = self
            .k3d
            .kubeconfig_get_write(ctx, cluster, Some(&path), KUBECONFIG_WRITE)
            .await
        {
            warn!(cluster = %cluster.name, path = %path.display(), error = %e, "Failed to write cluster kubeconfig");
            diags.push(
                Diagnostic::warning("Failed to write cluster kubeconfig", e.to_string())
                    .with_code(DiagnosticCode::SideEffectFailure),
            );
        }
    }
}

fn decode(what: &'static str, value: &Json) -> Result<ClusterData, Diagnostics> {
    ClusterData::from_json(value).map_err(|e| ProviderError::decode(what, e).to_diagnostic().into())
}

fn missing_name() -> Diagnostics {
    Diagnostic::error("Missing cluster name", "The cluster name is not known.")
        .with_code(DiagnosticCode::ValidationFailure)
        .into()
}

fn external_failure(summary: &str, err: &K3dError) -> Diagnostic {
    Diagnostic::error(summary, err.to_string()).with_code(DiagnosticCode::ExternalOperationFailure)
}

/// Refresh `base` from the live cluster.
///
/// Only server and agent nodes are counted and inspected for their image.
/// When they disagree on the image, `image_sha` is left null with a warning.
pub async fn read_cluster(
    k3d: &dyn K3dClient,
    ctx: &OpContext,
    name: &str,
    base: ClusterData,
) -> Outcome<ClusterData> {
    let cluster = match k3d.cluster_get(ctx, name).await {
        Ok(cluster) => cluster,
        Err(e) if e.is_not_found() => {
            return Outcome::failed(
                Diagnostic::error("Cluster not found", format!("Cluster '{}' does not exist", name))
                    .with_code(DiagnosticCode::NotFound)
                    .into(),
            )
        }
        Err(e) => return Outcome::failed(external_failure("Failed to read the cluster", &e).into()),
    };

    let mut diags = Diagnostics::new();
    let mut data = base;
    let mut servers = 0;
    let mut agents = 0;
    let mut images = BTreeSet::new();

    for node in &cluster.nodes {
        match node.role {
            NodeRole::Server => servers += 1,
            NodeRole::Agent => agents += 1,
            _ => continue,
        }
        images.insert(node.image.clone());
    }

    data.servers = AttrValue::Known(servers);
    data.agents = AttrValue::Known(agents);
    data.image_sha = match images.len() {
        0 => AttrValue::Null,
        1 => images.into_iter().next().into(),
        _ => {
            let list = images.into_iter().collect::<Vec<_>>().join(", ");
            warn!(cluster = %name, images = %list, "Multiple node images found");
            diags.push(
                Diagnostic::warning(
                    "Multiple node images found",
                    format!("Cluster nodes run different images: {}", list),
                )
                .with_code(DiagnosticCode::AmbiguousState),
            );
            AttrValue::Null
        }
    };

    data.network = if cluster.network.name.is_empty() {
        AttrValue::Null
    } else {
        AttrValue::Known(cluster.network.name.clone())
    };
    data.name = AttrValue::Known(cluster.name.clone());
    data.id = AttrValue::Known(cluster.name.clone());

    if let Some(api) = &cluster.kube_api {
        data.k8s_api_host = if api.host.is_empty() {
            AttrValue::Null
        } else {
            AttrValue::Known(api.host.clone())
        };
        data.k8s_api_host_ip = if api.binding.host_ip.is_empty() {
            AttrValue::Null
        } else {
            AttrValue::Known(api.binding.host_ip.clone())
        };
        data.k8s_api_host_port = match api.binding.host_port.parse::<u16>() {
            Ok(port) => AttrValue::Known(i64::from(port)),
            Err(_) => {
                diags.push(
                    Diagnostic::warning(
                        "Invalid port found in cluster settings",
                        format!("Cannot parse Kubernetes API host port '{}'", api.binding.host_port),
                    )
                    .with_code(DiagnosticCode::AmbiguousState),
                );
                AttrValue::Null
            }
        };
    }

    debug!(cluster = %name, servers, agents, "Read cluster");
    Outcome::with_value(data.into_state(), diags)
}

#[async_trait]
impl Resource for ClusterResource {
    fn type_name(&self) -> &'static str {
        CLUSTER_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        cluster_schema()
    }

    async fn create(&self, ctx: &OpContext, planned: &Json) -> Outcome<Json> {
        let data = match decode("cluster plan", planned) {
            Ok(data) => data,
            Err(diags) => return Outcome::failed(diags),
        };
        let Some(name) = data.cluster_name().map(str::to_string) else {
            return Outcome::failed(missing_name());
        };

        match self.k3d.cluster_get(ctx, &name).await {
            Ok(_) => {
                return Outcome::failed(
                    Diagnostic::error(
                        "A cluster with the same name already exists",
                        format!("Cluster '{}' already exists; import it or choose another name", name),
                    )
                    .with_code(DiagnosticCode::Conflict)
                    .into(),
                )
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                return Outcome::failed(external_failure("Failed to look up the cluster", &e).into())
            }
        }

        let data = data.with_defaults();
        let config = match self.build_config(&name, &data) {
            Ok(config) => config,
            Err(e) => {
                return Outcome::failed(
                    Diagnostic::error("Invalid cluster configuration", e.to_string())
                        .with_code(DiagnosticCode::ConfigTransformFailure)
                        .into(),
                )
            }
        };

        info!(cluster = %name, servers = config.cluster.servers().count(), "Creating cluster");
        let mut diags = Diagnostics::new();
        if let Err(e) = self.k3d.cluster_run(ctx, &config).await {
            warn!(cluster = %name, error = %e, "Cluster creation failed, rolling back");
            diags.push(external_failure("Failed to create the cluster", &e));

            let rollback = ClusterDeleteOpts {
                skip_registry_check: true,
            };
            if let Err(rb) = self.k3d.cluster_delete(ctx, &config.cluster, rollback).await {
                diags.push(
                    Diagnostic::warning("Failed to roll back the cluster", rb.to_string())
                        .with_code(DiagnosticCode::ExternalOperationFailure),
                );
            }
            return Outcome::failed(diags);
        }

        self.write_kubeconfigs(ctx, &config, &mut diags).await;

        let (state, read_diags) = read_cluster(self.k3d.as_ref(), ctx, &name, data).await.into_parts();
        diags.extend(read_diags);
        match state {
            Some(state) => {
                info!(cluster = %name, "Created cluster");
                let (json, encode_diags) = encode_state("cluster state", &state).into_parts();
                diags.extend(encode_diags);
                match json {
                    Some(json) => Outcome::with_value(json, diags),
                    None => Outcome::failed(diags),
                }
            }
            None => Outcome::failed(diags),
        }
    }

    async fn read(&self, ctx: &OpContext, state: &Json) -> Outcome<Json> {
        let data = match decode("cluster state", state) {
            Ok(data) => data,
            Err(diags) => return Outcome::failed(diags),
        };
        let Some(name) = data.cluster_name().map(str::to_string) else {
            return Outcome::failed(missing_name());
        };

        let (state, mut diags) = read_cluster(self.k3d.as_ref(), ctx, &name, data).await.into_parts();
        let Some(state) = state else {
            return Outcome::failed(diags);
        };
        let (json, encode_diags) = encode_state("cluster state", &state).into_parts();
        diags.extend(encode_diags);
        match json {
            Some(json) => Outcome::with_value(json, diags),
            None => Outcome::failed(diags),
        }
    }

    async fn update(&self, _ctx: &OpContext, _prior: &Json, _planned: &Json) -> Outcome<Json> {
        Outcome::failed(
            Diagnostic::error(
                "Updates are unsupported",
                "Every k3d_cluster attribute requires replacement; the cluster cannot be changed in place.",
            )
            .with_code(DiagnosticCode::Unsupported)
            .into(),
        )
    }

    async fn delete(&self, ctx: &OpContext, state: &Json) -> Diagnostics {
        let data = match decode("cluster state", state) {
            Ok(data) => data,
            Err(diags) => return diags,
        };
        let Some(name) = data.cluster_name().map(str::to_string) else {
            return missing_name();
        };

        let cluster = match self.k3d.cluster_get(ctx, &name).await {
            Ok(cluster) => cluster,
            Err(e) if e.is_not_found() => {
                info!(cluster = %name, "Cluster already absent");
                return Diagnostics::new();
            }
            Err(e) => return external_failure("Failed to look up the cluster", &e).into(),
        };

        info!(cluster = %name, "Deleting cluster");
        if let Err(e) = self
            .k3d
            .cluster_delete(ctx, &cluster, ClusterDeleteOpts::default())
            .await
        {
            return external_failure("Failed to delete the cluster", &e).into();
        }

        if let Err(e) = self
            .k3d
            .kubeconfig_remove_cluster_from_default(ctx, &cluster)
            .await
        {
            return Diagnostic::error(
                "Failed to remove the cluster from the default kubeconfig",
                e.to_string(),
            )
            .with_code(DiagnosticCode::SideEffectFailure)
            .into();
        }

        let path = match self.config.config_dir() {
            Ok(dir) => standalone_kubeconfig_path(&dir, &name),
            Err(e) => return ProviderError::from(e).to_diagnostic().into(),
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Removed cluster kubeconfig"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Diagnostic::error(
                    "Failed to remove the cluster kubeconfig",
                    format!("{}: {}", path.display(), e),
                )
                .with_code(DiagnosticCode::SideEffectFailure)
                .into()
            }
        }

        info!(cluster = %name, "Deleted cluster");
        Diagnostics::new()
    }
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
