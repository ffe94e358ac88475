// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider root: type registry, schema export and request routing.
//!
//! Resource and data source handlers are built on demand from a registry of
//! constructor functions keyed by type name.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{debug, info};

use crate::config::{BackendKind, ProviderConfig};
use crate::context::OpContext;
use crate::diagnostics::{Diagnostics, Outcome};
use crate::error::ProviderError;
use crate::k3d::{CliK3dClient, InMemoryK3d, K3dClient};
use crate::resources::cluster_types::CLUSTER_TYPE_NAME;
use crate::resources::nodes::NODES_TYPE_NAME;
use crate::resources::{ClusterResource, DataSource, NodesDataSource, Resource};
use crate::schema::{plan_resource_change, validate_config, PlannedChange, Schema, SchemaDescriptor};

pub const PROVIDER_TYPE_NAME: &str = "k3d";

/// Shared collaborators handed to every handler constructor.
#[derive(Clone)]
pub struct ProviderContext {
    pub k3d: Arc<dyn K3dClient>,
    pub config: Arc<ProviderConfig>,
}

impl ProviderContext {
    /// Build the context for the configured backend.
    pub fn from_config(config: ProviderConfig) -> Self {
        let k3d: Arc<dyn K3dClient> = match config.backend {
            BackendKind::Cli => Arc::new(
                CliK3dClient::new(config.k3d_binary.clone())
                    .with_default_kubeconfig(config.kubeconfig_path.clone()),
            ),
            BackendKind::Memory => {
                let memory = InMemoryK3d::new();
                match &config.kubeconfig_path {
                    Some(path) => Arc::new(memory.with_default_kubeconfig(path.clone())),
                    None => Arc::new(memory),
                }
            }
        };
        info!(backend = ?config.backend, binary = %config.k3d_binary.display(), "Selected k3d backend");
        Self {
            k3d,
            config: Arc::new(config),
        }
    }

    pub fn with_client(k3d: Arc<dyn K3dClient>, config: ProviderConfig) -> Self {
        Self {
            k3d,
            config: Arc::new(config),
        }
    }
}

pub type ResourceFactory = fn(&ProviderContext) -> Box<dyn Resource>;
pub type DataSourceFactory = fn(&ProviderContext) -> Box<dyn DataSource>;

fn new_cluster_resource(ctx: &ProviderContext) -> Box<dyn Resource> {
    Box::new(ClusterResource::new(ctx.k3d.clone(), ctx.config.clone()))
}

fn new_nodes_data_source(ctx: &ProviderContext) -> Box<dyn DataSource> {
    Box::new(NodesDataSource::new(ctx.k3d.clone()))
}

/// Type name to handler constructor.
#[derive(Clone, Default)]
pub struct Registry {
    resources: BTreeMap<&'static str, ResourceFactory>,
    data_sources: BTreeMap<&'static str, DataSourceFactory>,
}

impl Registry {
    /// Registry with every type this provider serves.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register_resource(CLUSTER_TYPE_NAME, new_cluster_resource);
        registry.register_data_source(NODES_TYPE_NAME, new_nodes_data_source);
        registry
    }

    pub fn register_resource(&mut self, name: &'static str, factory: ResourceFactory) {
        self.resources.insert(name, factory);
    }

    pub fn register_data_source(&mut self, name: &'static str, factory: DataSourceFactory) {
        self.data_sources.insert(name, factory);
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub type_name: String,
    pub version: String,
    pub resources: Vec<String>,
    pub data_sources: Vec<String>,
}

/// Every schema the provider exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSchemas {
    pub provider: SchemaDescriptor,
    pub resources: BTreeMap<String, SchemaDescriptor>,
    pub data_sources: BTreeMap<String, SchemaDescriptor>,
}

/// The provider has no configurable attributes.
pub fn provider_schema() -> Schema {
    Schema::new("Manage k3d clusters and inspect their nodes")
}

pub struct K3dProvider {
    registry: Registry,
    context: ProviderContext,
}

impl K3dProvider {
    pub fn new(context: ProviderContext) -> Self {
        Self::with_registry(context, Registry::builtin())
    }

    pub fn with_registry(context: ProviderContext, registry: Registry) -> Self {
        Self { registry, context }
    }

    pub fn from_config(config: ProviderConfig) -> Self {
        Self::new(ProviderContext::from_config(config))
    }

    pub fn context(&self) -> &ProviderContext {
        &self.context
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            resources: self.registry.resource_types().map(str::to_string).collect(),
            data_sources: self.registry.data_source_types().map(str::to_string).collect(),
        }
    }

    pub fn schemas(&self) -> ProviderSchemas {
        ProviderSchemas {
            provider: provider_schema().descriptor(),
            resources: self
                .registry
                .resources
                .iter()
                .map(|(name, factory)| (name.to_string(), factory(&self.context).schema().descriptor()))
                .collect(),
            data_sources: self
                .registry
                .data_sources
                .iter()
                .map(|(name, factory)| (name.to_string(), factory(&self.context).schema().descriptor()))
                .collect(),
        }
    }

    /// Accept the practitioner's provider block.
    pub fn configure(&self, config: &Json) -> Diagnostics {
        let empty = Json::Object(Default::default());
        let config = if config.is_null() { &empty } else { config };
        let diags = validate_config(&provider_schema(), config);
        if !diags.has_error() {
            debug!("Provider configured");
        }
        diags
    }

    pub fn resource(&self, type_name: &str) -> Result<Box<dyn Resource>, ProviderError> {
        self.registry
            .resources
            .get(type_name)
            .map(|factory| factory(&self.context))
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> Result<Box<dyn DataSource>, ProviderError> {
        self.registry
            .data_sources
            .get(type_name)
            .map(|factory| factory(&self.context))
            .ok_or_else(|| ProviderError::UnknownDataSourceType(type_name.to_string()))
    }

    pub fn validate_resource_config(&self, type_name: &str, config: &Json) -> Diagnostics {
        match self.resource(type_name) {
            Ok(resource) => validate_config(&resource.schema(), config),
            Err(e) => e.to_diagnostic().into(),
        }
    }

    pub fn validate_data_source_config(&self, type_name: &str, config: &Json) -> Diagnostics {
        match self.data_source(type_name) {
            Ok(source) => validate_config(&source.schema(), config),
            Err(e) => e.to_diagnostic().into(),
        }
    }

    pub fn plan_resource_change(
        &self,
        type_name: &str,
        prior_state: Option<&Json>,
        config: Option<&Json>,
    ) -> Outcome<PlannedChange> {
        match self.resource(type_name) {
            Ok(resource) => plan_resource_change(&resource.schema(), prior_state, config),
            Err(e) => Outcome::failed(e.to_diagnostic().into()),
        }
    }

    /// Apply a planned change: create without prior state, delete without a
    /// planned state, update otherwise. The new state is `None` after delete.
    pub async fn apply_resource_change(
        &self,
        ctx: &OpContext,
        type_name: &str,
        prior_state: Option<&Json>,
        planned_state: Option<&Json>,
    ) -> Outcome<Option<Json>> {
        let resource = match self.resource(type_name) {
            Ok(resource) => resource,
            Err(e) => return Outcome::failed(e.to_diagnostic().into()),
        };
        let prior_state = prior_state.filter(|s| !s.is_null());
        let planned_state = planned_state.filter(|s| !s.is_null());

        match (prior_state, planned_state) {
            (None, Some(planned)) => resource.create(ctx, planned).await.map(Some),
            (Some(prior), None) => {
                let diags = resource.delete(ctx, prior).await;
                Outcome::with_value(None, diags)
            }
            (Some(prior), Some(planned)) => resource.update(ctx, prior, planned).await.map(Some),
            (None, None) => Outcome::ok(None),
        }
    }

    pub async fn read_resource(&self, ctx: &OpContext, type_name: &str, state: &Json) -> Outcome<Json> {
        match self.resource(type_name) {
            Ok(resource) => resource.read(ctx, state).await,
            Err(e) => Outcome::failed(e.to_diagnostic().into()),
        }
    }

    pub async fn read_data_source(&self, ctx: &OpContext, type_name: &str, config: &Json) -> Outcome<Json> {
        let source = match self.data_source(type_name) {
            Ok(source) => source,
            Err(e) => return Outcome::failed(e.to_diagnostic().into()),
        };
        let diags = validate_config(&source.schema(), config);
        if diags.has_error() {
            return Outcome::failed(diags);
        }
        source.read(ctx, config).await
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
