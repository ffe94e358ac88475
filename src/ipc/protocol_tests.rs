// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for protocol types and codec.

use super::super::protocol_codec::*;
use super::super::protocol_types::*;
use crate::diagnostics::{Diagnostic, Diagnostics};
use serde_json::json;

#[test]
fn test_protocol_version_default() {
    assert_eq!(ProtocolVersion::default(), ProtocolVersion::V1);
}

#[test]
fn test_protocol_version_negotiate() {
    assert_eq!(ProtocolVersion::negotiate(None), ProtocolVersion::V1);
    assert_eq!(
        ProtocolVersion::negotiate(Some(ProtocolVersion::V1)),
        ProtocolVersion::V1
    );
    assert!(MIN_PROTOCOL_VERSION.is_supported());
}

#[test]
fn test_message_wire_shape() {
    let envelope = Envelope::new(
        RequestId(7),
        Message::ReadDataSource {
            type_name: "k3d_nodes".into(),
            config: json!({ "cluster_name": "dev" }),
        },
    );
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["id"], json!(7));
    assert_eq!(value["message"]["type"], json!("read_data_source"));
    assert_eq!(value["message"]["config"]["cluster_name"], json!("dev"));
}

#[test]
fn test_decode_request_with_missing_optionals() {
    let raw = br#"{"id":1,"message":{"type":"apply_resource_change","type_name":"k3d_cluster","prior_state":{"name":"dev"}}}"#;
    let envelope = decode_message(raw).unwrap();
    match envelope.message {
        Message::ApplyResourceChange {
            prior_state,
            planned_state,
            ..
        } => {
            assert_eq!(prior_state, Some(json!({ "name": "dev" })));
            assert_eq!(planned_state, None);
        }
        other => panic!("unexpected message {:?}", other),
    }
}

#[test]
fn test_decode_unit_messages() {
    let envelope = decode_message(br#"{"id":2,"message":{"type":"stop"}}"#).unwrap();
    assert_eq!(envelope.message, Message::Stop);

    let envelope = decode_message(br#"{"id":3,"message":{"type":"handshake"}}"#).unwrap();
    assert_eq!(
        envelope.message,
        Message::Handshake {
            protocol_version: None
        }
    );
}

#[test]
fn test_decode_unknown_type_fails() {
    let result = decode_message(br#"{"id":1,"message":{"type":"launch_missiles"}}"#);
    assert!(matches!(result, Err(ProtocolError::Serialization(_))));
}

#[test]
fn test_encode_decode_with_diagnostics() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.push(Diagnostic::warning("Multiple node images found", "a, b"));
    let envelope = Envelope::new(
        RequestId(9),
        Message::ReadResourceResponse {
            new_state: Some(json!({ "id": "dev" })),
            diagnostics,
        },
    );
    let decoded = decode_message(&encode_message(&envelope).unwrap()).unwrap();
    assert_eq!(decoded, envelope);
    assert_eq!(decoded.message.diagnostics().unwrap().len(), 1);
}

#[test]
fn test_decode_message_too_large() {
    let large_data = vec![0u8; MAX_MESSAGE_SIZE + 1];
    let result = decode_message(&large_data);
    assert!(matches!(result, Err(ProtocolError::MessageTooLarge { .. })));
}

#[test]
fn test_encode_response_too_large_becomes_error() {
    let big = "x".repeat(MAX_MESSAGE_SIZE);
    let envelope = Envelope::new(
        RequestId(4),
        Message::ReadDataSourceResponse {
            state: Some(json!({ "blob": big })),
            diagnostics: Diagnostics::new(),
        },
    );
    let bytes = encode_response(&envelope).unwrap();
    let decoded = decode_message(&bytes).unwrap();
    assert_eq!(decoded.id, RequestId(4));
    assert!(matches!(
        decoded.message,
        Message::Error {
            code: error_codes::PAYLOAD_TOO_LARGE,
            ..
        }
    ));
}

#[test]
fn test_message_kind() {
    assert_eq!(Message::GetSchema.kind(), "get_schema");
    assert_eq!(Message::error(500, "boom").kind(), "error");
}
