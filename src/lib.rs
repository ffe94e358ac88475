// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! k3d infrastructure provider.
//!
//! Exposes k3d clusters as the `k3d_cluster` resource and their containers
//! as the `k3d_nodes` data source. The host engine drives the provider over
//! a length-prefixed JSON protocol on stdio; all cluster work is delegated to
//! a [`k3d::K3dClient`].

pub mod cli;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod ipc;
pub mod k3d;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod value;

pub use config::{BackendKind, ConfigError, ProviderConfig};
pub use context::OpContext;
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Outcome, Severity};
pub use error::ProviderError;
pub use provider::{K3dProvider, ProviderContext, Registry};
pub use value::AttrValue;
