// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! k3d provider entry point.
//!
//! Runs the provider protocol server on stdio by default, with a few
//! operator commands for configuration and inspection.

mod cli_parser;
mod provider_init;

use std::process::ExitCode;

use k3d_provider::cli::{config_cmd, nodes_cmd};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "serve" | "" => run_serve().await,
        "help" | "--help" | "-h" => {
            if let Some(sub) = args.get(2) {
                cli_parser::print_command_help(sub);
            } else {
                cli_parser::print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("k3d-provider {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "schema" => exit_code(config_cmd::run_schema()),
        "nodes" => run_nodes_cmd(&args).await,
        "config" => run_config_cmd(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            cli_parser::print_usage();
            ExitCode::FAILURE
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run_serve() -> ExitCode {
    let config = match provider_init::init() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(2u8);
        }
    };
    match provider_init::run_provider(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_nodes_cmd(args: &[String]) -> ExitCode {
    let Some(cluster) = args.get(2).filter(|a| !a.starts_with('-')) else {
        eprintln!("Missing cluster name");
        cli_parser::print_command_help("nodes");
        return ExitCode::FAILURE;
    };
    let as_json = args.iter().skip(3).any(|a| a == "--json");
    exit_code(nodes_cmd::run_nodes(cluster, as_json).await)
}

fn run_config_cmd(args: &[String]) -> ExitCode {
    let sub = args.get(2).map(|s| s.as_str()).unwrap_or("show");
    match sub {
        "show" => exit_code(config_cmd::run_show()),
        "defaults" => exit_code(config_cmd::run_defaults()),
        "validate" => exit_code(config_cmd::run_validate()),
        _ => {
            eprintln!("Unknown config subcommand: {}", sub);
            cli_parser::print_command_help("config");
            ExitCode::FAILURE
        }
    }
}
