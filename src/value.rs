// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tri-state attribute values.
//!
//! Every attribute travelling between the host engine and the provider is
//! either unset (`Null`), not yet known during planning (`Unknown`), or a
//! concrete value. On the wire an unknown value is `{"$unknown": true}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker key used to encode unknown values in JSON.
pub const UNKNOWN_MARKER: &str = "$unknown";

/// An attribute value as seen by plans and state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue<T> {
    Null,
    Unknown,
    Known(T),
}

impl<T> Default for AttrValue<T> {
    fn default() -> Self {
        AttrValue::Null
    }
}

impl<T> AttrValue<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AttrValue::Unknown)
    }

    /// True when the value is neither null nor unknown.
    pub fn is_known(&self) -> bool {
        matches!(self, AttrValue::Known(_))
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            AttrValue::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_known(self) -> Option<T> {
        match self {
            AttrValue::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Collapse `Unknown` to `Null`; state must not carry unknowns.
    pub fn unknown_as_null(self) -> Self {
        match self {
            AttrValue::Unknown => AttrValue::Null,
            other => other,
        }
    }

    /// Replace a null or unknown value with `default`.
    pub fn or_default_value(self, default: T) -> Self {
        match self {
            AttrValue::Known(v) => AttrValue::Known(v),
            AttrValue::Null | AttrValue::Unknown => AttrValue::Known(default),
        }
    }
}

impl<T: Clone> AttrValue<T> {
    /// Known value or the given fallback.
    pub fn known_or(&self, fallback: T) -> T {
        self.as_known().cloned().unwrap_or(fallback)
    }
}

impl<T> From<Option<T>> for AttrValue<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => AttrValue::Known(v),
            None => AttrValue::Null,
        }
    }
}

/// JSON encoding of an unknown value.
pub fn unknown_json() -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert(UNKNOWN_MARKER.to_string(), serde_json::Value::Bool(true));
    serde_json::Value::Object(map)
}

/// True if a raw JSON value is the unknown marker.
pub fn is_unknown_json(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Object(map) => {
            map.len() == 1 && map.get(UNKNOWN_MARKER) == Some(&serde_json::Value::Bool(true))
        }
        _ => false,
    }
}

impl<T: DeserializeOwned> AttrValue<T> {
    /// Decode a raw JSON attribute value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(AttrValue::Null);
        }
        if is_unknown_json(value) {
            return Ok(AttrValue::Unknown);
        }
        Ok(AttrValue::Known(T::deserialize(value)?))
    }
}

impl<T: Serialize> AttrValue<T> {
    /// Encode as a raw JSON attribute value.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            AttrValue::Null => Ok(serde_json::Value::Null),
            AttrValue::Unknown => Ok(unknown_json()),
            AttrValue::Known(v) => serde_json::to_value(v),
        }
    }
}

impl<T: Serialize> Serialize for AttrValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Null => serializer.serialize_none(),
            AttrValue::Unknown => unknown_json().serialize(serializer),
            AttrValue::Known(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for AttrValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        AttrValue::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
