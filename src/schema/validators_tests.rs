// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for attribute validators.

use super::*;
use serde_json::json;

#[test]
fn test_port_accepts_valid_range() {
    for port in [1, 6550, 65535] {
        assert!(PortValidator.check(&AttrValue::Known(port)).is_ok(), "port {}", port);
    }
}

#[test]
fn test_port_rejects_out_of_range() {
    for port in [0, 65536, -1] {
        assert_eq!(
            PortValidator.check(&AttrValue::Known(port)),
            Err(ValidationError::PortOutOfRange(port))
        );
    }
}

#[test]
fn test_port_skips_null_and_unknown() {
    assert!(PortValidator.check(&AttrValue::Null).is_ok());
    assert!(PortValidator.check(&AttrValue::Unknown).is_ok());
}

#[test]
fn test_port_diagnostic_is_attribute_scoped() {
    let path = AttributePath::root("k8s_api_host_port");
    let diags = PortValidator.validate(&path, &json!(0));
    assert_eq!(diags.len(), 1);
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.attribute.as_ref(), Some(&path));
    assert_eq!(diag.code, Some(DiagnosticCode::ValidationFailure));
    assert!(diag.detail.contains("got: 0"));
}

#[test]
fn test_port_unknown_marker_passes() {
    let diags = PortValidator.validate(&AttributePath::root("p"), &json!({ "$unknown": true }));
    assert!(diags.is_empty());
}

#[test]
fn test_port_wrong_type_reported() {
    let diags = PortValidator.validate(&AttributePath::root("p"), &json!("6550"));
    assert!(diags.has_error());
    assert_eq!(diags.iter().next().unwrap().summary, "Invalid Attribute Type");
}

#[test]
fn test_ip_accepts_dotted_quad() {
    for ip in ["127.0.0.1", "10.0.0.5"] {
        assert!(IpValidator.check(&AttrValue::Known(ip.to_string())).is_ok(), "{}", ip);
    }
}

#[test]
fn test_ip_rejects_invalid() {
    for ip in ["not-an-ip", "256.1.1.1", "::1", ""] {
        assert!(IpValidator.check(&AttrValue::Known(ip.to_string())).is_err(), "{}", ip);
    }
}

#[test]
fn test_ip_skips_null_and_unknown() {
    assert!(IpValidator.check(&AttrValue::Null).is_ok());
    assert!(IpValidator.check(&AttrValue::Unknown).is_ok());
}

#[test]
fn test_length_between() {
    let v = LengthBetween::new(10, 256);
    assert!(v.check(&AttrValue::Known("k3dapihost1".to_string())).is_ok());
    assert!(matches!(
        v.check(&AttrValue::Known("short".to_string())),
        Err(ValidationError::LengthOutOfRange { len: 5, min: 10, max: 256 })
    ));
    assert!(v.check(&AttrValue::Known("x".repeat(257))).is_err());
}

#[test]
fn test_regex_matches() {
    let v = RegexMatches::new(
        Regex::new("^[a-z0-9]+$").unwrap(),
        "must contain only lowercase alphanumeric characters",
    );
    assert!(v.check(&AttrValue::Known("apihost01".to_string())).is_ok());
    assert!(v.check(&AttrValue::Known("Api-Host".to_string())).is_err());
    assert_eq!(v.description(), "must contain only lowercase alphanumeric characters");
}

#[test]
fn test_validators_are_independent() {
    let path = AttributePath::root("k8s_api_host");
    let length = LengthBetween::new(10, 256).validate(&path, &json!("UPPER"));
    let pattern = RegexMatches::new(Regex::new("^[a-z0-9]+$").unwrap(), "lowercase only")
        .validate(&path, &json!("UPPER"));
    assert_eq!(length.len(), 1);
    assert_eq!(pattern.len(), 1);
}

#[test]
fn test_validation_error_messages() {
    assert_eq!(ValidationError::PortOutOfRange(0).to_string(), "0");
    assert_eq!(
        ValidationError::LengthOutOfRange { len: 5, min: 10, max: 256 }.to_string(),
        "length 5 not between 10 and 256"
    );
    let err: Box<dyn std::error::Error> = Box::new(ValidationError::TypeMismatch {
        expected: "number",
        detail: "got string".into(),
    });
    assert_eq!(err.to_string(), "expected number: got string");
}
