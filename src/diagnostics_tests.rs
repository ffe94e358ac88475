// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for diagnostics and outcomes.

use super::*;

#[test]
fn test_warnings_do_not_block_value() {
    let mut diags = Diagnostics::new();
    diags.add_warning("Error writing kubeconfig", "permission denied");
    let outcome = Outcome::with_value(42, diags);
    assert!(outcome.is_success());
    assert_eq!(outcome.value(), Some(&42));
    assert_eq!(outcome.diagnostics.warnings().count(), 1);
}

#[test]
fn test_error_drops_value() {
    let mut diags = Diagnostics::new();
    diags.add_error("Error creating cluster", "boom");
    let outcome = Outcome::with_value(42, diags);
    assert!(!outcome.is_success());
    assert!(outcome.value().is_none());
}

#[test]
fn test_extend_preserves_order() {
    let mut first = Diagnostics::new();
    first.add_error("first", "");
    let mut second = Diagnostics::new();
    second.add_warning("second", "");
    second.add_warning("third", "");
    first.extend(second);

    let summaries: Vec<_> = first.iter().map(|d| d.summary.as_str()).collect();
    assert_eq!(summaries, vec!["first", "second", "third"]);
}

#[test]
fn test_has_code() {
    let diags: Diagnostics = Diagnostic::error("Error reading k3d cluster", "gone")
        .with_code(DiagnosticCode::NotFound)
        .into();
    assert!(diags.has_code(DiagnosticCode::NotFound));
    assert!(!diags.has_code(DiagnosticCode::Conflict));
}

#[test]
fn test_display_with_attribute() {
    let diag = Diagnostic::error("Invalid Attribute Value", "got 0")
        .at(AttributePath::root("k8s_api_host_port"));
    assert_eq!(
        diag.to_string(),
        "error at k8s_api_host_port: Invalid Attribute Value (got 0)"
    );
}

#[test]
fn test_attribute_path_child() {
    let path = AttributePath::root("nodes").child("k3d-dev-server-0").child("role");
    assert_eq!(path.to_string(), "nodes.k3d-dev-server-0.role");
    assert_eq!(path.steps().len(), 3);
}

#[test]
fn test_serialized_diagnostics_omit_empty_fields() {
    let diags: Diagnostics = Diagnostic::warning("Multiple node images found", "a, b").into();
    let json = serde_json::to_value(&diags).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "severity": "warning",
            "summary": "Multiple node images found",
            "detail": "a, b"
        }])
    );
}
