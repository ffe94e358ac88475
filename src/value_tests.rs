// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for tri-state attribute values.

use super::*;
use serde_json::json;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Sample {
    #[serde(default)]
    name: AttrValue<String>,
    #[serde(default)]
    count: AttrValue<i64>,
}

#[test]
fn test_missing_key_decodes_as_null() {
    let sample: Sample = serde_json::from_value(json!({ "name": "dev" })).unwrap();
    assert_eq!(sample.name, AttrValue::Known("dev".to_string()));
    assert!(sample.count.is_null());
}

#[test]
fn test_unknown_marker_decodes_as_unknown() {
    let sample: Sample =
        serde_json::from_value(json!({ "name": null, "count": { "$unknown": true } })).unwrap();
    assert!(sample.name.is_null());
    assert!(sample.count.is_unknown());
}

#[test]
fn test_unknown_serializes_to_marker() {
    let sample = Sample {
        name: AttrValue::Unknown,
        count: AttrValue::Known(3),
    };
    let value = serde_json::to_value(&sample).unwrap();
    assert_eq!(value, json!({ "name": { "$unknown": true }, "count": 3 }));
}

#[test]
fn test_object_with_extra_keys_is_not_unknown() {
    let raw = json!({ "$unknown": true, "other": 1 });
    assert!(!is_unknown_json(&raw));
}

#[test]
fn test_type_mismatch_is_an_error() {
    let result = AttrValue::<i64>::from_json(&json!("six"));
    assert!(result.is_err());
}

#[test]
fn test_or_default_value() {
    assert_eq!(AttrValue::<i64>::Null.or_default_value(1), AttrValue::Known(1));
    assert_eq!(AttrValue::<i64>::Unknown.or_default_value(1), AttrValue::Known(1));
    assert_eq!(AttrValue::Known(0).or_default_value(1), AttrValue::Known(0));
}
