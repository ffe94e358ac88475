// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! `config` and `schema` commands.

use super::exit;
use crate::config::ProviderConfig;
use crate::provider::K3dProvider;

/// Print the effective configuration as TOML.
pub fn run_show() -> i32 {
    match ProviderConfig::load() {
        Ok(config) => print_toml(&config),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            exit::CONFIG_ERROR
        }
    }
}

/// Print the built-in defaults as TOML.
pub fn run_defaults() -> i32 {
    print_toml(&ProviderConfig::default())
}

pub fn run_validate() -> i32 {
    match ProviderConfig::load() {
        Ok(_) => {
            println!("Configuration is valid");
            exit::SUCCESS
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            exit::CONFIG_ERROR
        }
    }
}

/// Print every resource and data source schema as JSON.
pub fn run_schema() -> i32 {
    let provider = K3dProvider::from_config(ProviderConfig::default());
    match serde_json::to_string_pretty(&provider.schemas()) {
        Ok(json) => {
            println!("{}", json);
            exit::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render schema: {}", e);
            exit::FAILURE
        }
    }
}

fn print_toml(config: &ProviderConfig) -> i32 {
    match config.to_toml() {
        Ok(toml) => {
            print!("{}", toml);
            exit::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            exit::FAILURE
        }
    }
}
