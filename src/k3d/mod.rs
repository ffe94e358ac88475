// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! k3d integration.
//!
//! Everything the provider needs from k3d goes through [`K3dClient`]:
//! - [`CliK3dClient`] runs the k3d binary
//! - [`InMemoryK3d`] simulates clusters in-process

pub mod cli_client;
pub mod client;
pub mod command;
pub mod config_transform;
pub mod kubeconfig;
pub mod memory;
pub mod types;

pub use cli_client::{CliK3dClient, DEFAULT_K3D_BINARY};
pub use client::{K3dClient, K3dError};
pub use command::{CommandLine, CommandOutput, CommandRunner, TokioCommandRunner};
pub use config_transform::{
    build_cluster_config, process_cluster_config, process_simple_config,
    transform_simple_to_cluster_config, validate_cluster_config, ClusterConfig,
    ConfigTransformError, SimpleConfig,
};
pub use kubeconfig::{Kubeconfig, KubeconfigError};
pub use memory::{FailPoint, InMemoryK3d};
pub use types::{
    Cluster, ClusterDeleteOpts, ClusterNetwork, ExposureOpts, Node, NodeRole, PortBinding,
    WriteKubeconfigOptions,
};
