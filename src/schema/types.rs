// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Attribute and schema definitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::plan_modifiers::PlanModifier;
use super::validators::AttributeValidator;
use crate::value::is_unknown_json;

/// Value type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int64,
    Bool,
    List { element: Box<AttributeType> },
    Set { element: Box<AttributeType> },
    Map { element: Box<AttributeType> },
    Object { attributes: BTreeMap<String, AttributeType> },
}

impl AttributeType {
    pub fn list(element: AttributeType) -> Self {
        Self::List {
            element: Box::new(element),
        }
    }

    pub fn set(element: AttributeType) -> Self {
        Self::Set {
            element: Box::new(element),
        }
    }

    pub fn map(element: AttributeType) -> Self {
        Self::Map {
            element: Box::new(element),
        }
    }

    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, AttributeType)>,
        K: Into<String>,
    {
        Self::Object {
            attributes: attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl AttributeType {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Int64 => "number",
            AttributeType::Bool => "bool",
            AttributeType::List { .. } => "list",
            AttributeType::Set { .. } => "set",
            AttributeType::Map { .. } => "map",
            AttributeType::Object { .. } => "object",
        }
    }

    /// True if `value` conforms to this type. Null and unknown conform to
    /// every type, at any depth.
    pub fn accepts(&self, value: &Json) -> bool {
        if value.is_null() || is_unknown_json(value) {
            return true;
        }
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Int64 => value.is_i64(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::List { element } | AttributeType::Set { element } => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| element.accepts(v))),
            AttributeType::Map { element } => value
                .as_object()
                .is_some_and(|map| map.values().all(|v| element.accepts(v))),
            AttributeType::Object { attributes } => value.as_object().is_some_and(|map| {
                map.iter().all(|(key, v)| {
                    attributes
                        .get(key)
                        .is_some_and(|attr_type| attr_type.accepts(v))
                })
            }),
        }
    }
}

/// A single schema attribute.
#[derive(Clone)]
pub struct Attribute {
    pub attr_type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub validators: Vec<Arc<dyn AttributeValidator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    /// Attributes of the object nested under each map key.
    pub nested: Option<BTreeMap<String, Attribute>>,
}

impl Attribute {
    pub fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            description: String::new(),
            required: false,
            optional: false,
            computed: false,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
            nested: None,
        }
    }

    /// Map of nested objects; the attribute type is derived from `attributes`.
    pub fn map_nested(attributes: BTreeMap<String, Attribute>) -> Self {
        let element = AttributeType::Object {
            attributes: attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.attr_type.clone()))
                .collect(),
        };
        let mut attr = Self::new(AttributeType::map(element));
        attr.nested = Some(attributes);
        attr
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validator(mut self, validator: impl AttributeValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.plan_modifiers.push(Arc::new(modifier));
        self
    }

    /// Static default supplied by the first modifier that declares one.
    pub fn default_value(&self) -> Option<&Json> {
        self.plan_modifiers.iter().find_map(|m| m.default_value())
    }

    /// True if the practitioner may set this attribute.
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }

    pub fn descriptor(&self) -> AttributeDescriptor {
        AttributeDescriptor {
            attr_type: self.attr_type.clone(),
            description: self.description.clone(),
            required: self.required,
            optional: self.optional,
            computed: self.computed,
            validators: self.validators.iter().map(|v| v.description()).collect(),
            plan_modifiers: self.plan_modifiers.iter().map(|m| m.description()).collect(),
            nested_attributes: self.nested.as_ref().map(|attrs| {
                attrs
                    .iter()
                    .map(|(name, attr)| (name.clone(), attr.descriptor()))
                    .collect()
            }),
        }
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("attr_type", &self.attr_type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("validators", &self.validators.len())
            .field("plan_modifiers", &self.plan_modifiers.len())
            .finish()
    }
}

/// Schema of a resource, data source, or the provider itself.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            version: 0,
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn descriptor(&self) -> SchemaDescriptor {
        SchemaDescriptor {
            version: self.version,
            description: self.description.clone(),
            attributes: self
                .attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.descriptor()))
                .collect(),
        }
    }
}

/// Serializable view of an attribute, sent to the host engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_attributes: Option<BTreeMap<String, AttributeDescriptor>>,
}

/// Serializable view of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub version: i64,
    pub description: String,
    pub attributes: BTreeMap<String, AttributeDescriptor>,
}
