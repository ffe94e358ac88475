// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Managed resources and data sources.
//!
//! Handlers take and return raw JSON objects. Decoding into typed models
//! happens inside each handler so decode failures surface as diagnostics.

pub mod cluster;
pub mod cluster_types;
pub mod nodes;

use async_trait::async_trait;
use serde_json::Value as Json;

use crate::context::OpContext;
use crate::diagnostics::{Diagnostics, Outcome};
use crate::schema::Schema;

pub use cluster::ClusterResource;
pub use cluster_types::ClusterData;
pub use nodes::{NodeRecord, NodesData, NodesDataSource, PortRecord};

/// Lifecycle of a managed resource.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, ctx: &OpContext, planned: &Json) -> Outcome<Json>;

    /// Refresh state. A resource that no longer exists fails with
    /// [`crate::diagnostics::DiagnosticCode::NotFound`].
    async fn read(&self, ctx: &OpContext, state: &Json) -> Outcome<Json>;

    async fn update(&self, ctx: &OpContext, prior: &Json, planned: &Json) -> Outcome<Json>;

    async fn delete(&self, ctx: &OpContext, state: &Json) -> Diagnostics;
}

/// A read-only data source.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, ctx: &OpContext, config: &Json) -> Outcome<Json>;
}

/// Encode a typed model as a state object.
pub(crate) fn encode_state<T: serde::Serialize>(what: &'static str, value: &T) -> Outcome<Json> {
    match serde_json::to_value(value) {
        Ok(json) => Outcome::ok(json),
        Err(e) => Outcome::failed(crate::ProviderError::encode(what, e).to_diagnostic().into()),
    }
}
