// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! `nodes` command: list the nodes of a cluster through the data source.

use serde_json::json;

use super::exit;
use super::nodes_format::print_nodes_human;
use crate::config::ProviderConfig;
use crate::context::OpContext;
use crate::provider::K3dProvider;
use crate::resources::nodes::{NodesData, NODES_TYPE_NAME};

pub async fn run_nodes(cluster_name: &str, as_json: bool) -> i32 {
    let config = match ProviderConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return exit::CONFIG_ERROR;
        }
    };
    let provider = K3dProvider::from_config(config);

    let outcome = provider
        .read_data_source(
            &OpContext::new(),
            NODES_TYPE_NAME,
            &json!({ "cluster_name": cluster_name }),
        )
        .await;
    for diagnostic in outcome.diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
    let Some(state) = outcome.value() else {
        return exit::FAILURE;
    };

    if as_json {
        return match serde_json::to_string_pretty(state) {
            Ok(text) => {
                println!("{}", text);
                exit::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render nodes: {}", e);
                exit::FAILURE
            }
        };
    }

    match serde_json::from_value::<NodesData>(state.clone()) {
        Ok(data) => {
            print_nodes_human(&data);
            exit::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to decode nodes: {}", e);
            exit::FAILURE
        }
    }
}
