// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Formatting helpers for the nodes command.

use std::collections::BTreeSet;

use crate::resources::nodes::{NodesData, PortRecord};

/// Print nodes in human-readable form.
pub fn print_nodes_human(data: &NodesData) {
    print!("{}", render_nodes(data));
}

pub fn render_nodes(data: &NodesData) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Cluster {} ({} nodes)\n",
        data.cluster_name,
        data.nodes.len()
    ));
    out.push_str("  Name                        | Role         | IP              | Ports\n");
    out.push_str("  ----------------------------+--------------+-----------------+------------------\n");
    for node in data.nodes.values() {
        out.push_str(&format!(
            "  {:27} | {:12} | {:15} | {}\n",
            truncate(&node.name, 27),
            node.role,
            truncate(&node.ip, 15),
            format_ports(&node.ports)
        ));
    }
    out
}

/// `host_ip:host_port->port` pairs, comma separated.
pub fn format_ports(ports: &BTreeSet<PortRecord>) -> String {
    if ports.is_empty() {
        return "-".to_string();
    }
    ports
        .iter()
        .map(|p| {
            if p.host_ip.is_empty() {
                format!("{}->{}", p.host_port, p.port)
            } else {
                format!("{}:{}->{}", p.host_ip, p.host_port, p.port)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncate a string to at most `max_len` characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
#[path = "nodes_format_tests.rs"]
mod tests;
