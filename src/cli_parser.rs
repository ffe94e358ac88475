// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Help text for the k3d-provider binary.

/// Print general usage information.
pub fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "k3d-provider - k3d clusters as infrastructure-as-code resources v{}

USAGE:
    k3d-provider [COMMAND] [OPTIONS]

COMMANDS:
    serve        Serve the provider protocol on stdio (default)
    schema       Print resource and data source schemas as JSON
    nodes        List the nodes of a cluster
    config       Manage configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

OPTIONS:
    -h, --help     Show help for command
    -V, --version  Show version information

EXAMPLES:
    k3d-provider                     # Serve the provider protocol
    k3d-provider schema              # Dump schemas
    k3d-provider nodes dev --json    # Nodes of cluster 'dev' as JSON
    k3d-provider config validate     # Validate configuration

ENVIRONMENT:
    K3D_PROVIDER_CONFIG               TOML configuration file
    K3D_PROVIDER_BACKEND              cli or memory
    K3D_PROVIDER_K3D_BINARY           k3d executable
    K3D_PROVIDER_CONFIG_DIR           Directory for per-cluster kubeconfigs
    K3D_PROVIDER_KUBECONFIG           Default kubeconfig to merge into
    K3D_PROVIDER_CREATE_TIMEOUT_SECS  Cluster readiness timeout
    K3D_PROVIDER_LOG_FORMAT           pretty or json
    K3D_PROVIDER_LOG_LEVEL            Log filter (RUST_LOG takes precedence)

EXIT CODES:
    0  Success
    1  Failure
    2  Configuration error
",
        version
    );
}

/// Print detailed help for a specific command.
pub fn print_command_help(command: &str) {
    match command {
        "serve" => print_serve_help(),
        "schema" => print_schema_help(),
        "nodes" => print_nodes_help(),
        "config" => print_config_help(),
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'k3d-provider help' for general usage.",
                command
            );
        }
    }
}

fn print_serve_help() {
    eprintln!(
        "k3d-provider serve - Serve the provider protocol

USAGE:
    k3d-provider serve

DESCRIPTION:
    Reads length-prefixed JSON requests from stdin and writes responses to
    stdout. Logs go to stderr. Exits when the host sends 'stop', closes
    stdin, or on interrupt.
"
    );
}

fn print_schema_help() {
    eprintln!(
        "k3d-provider schema - Print schemas

USAGE:
    k3d-provider schema
"
    );
}

fn print_nodes_help() {
    eprintln!(
        "k3d-provider nodes - List cluster nodes

USAGE:
    k3d-provider nodes <CLUSTER> [--json]

OPTIONS:
    --json         Output in JSON format

EXAMPLES:
    k3d-provider nodes dev
"
    );
}

fn print_config_help() {
    eprintln!(
        "k3d-provider config - Manage configuration

USAGE:
    k3d-provider config <SUBCOMMAND>

SUBCOMMANDS:
    show           Show effective configuration
    defaults       Show default configuration
    validate       Validate configuration
"
    );
}
