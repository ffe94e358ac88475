// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Plan modifiers.
//!
//! A modifier receives the configured, planned and prior values of one
//! attribute and returns the (possibly rewritten) planned value plus a
//! replacement flag. Modifiers hold no mutable state.

use serde::Serialize;
use serde_json::Value as Json;

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::value::is_unknown_json;

/// Input to a plan modifier for a single attribute.
#[derive(Debug, Clone, Copy)]
pub struct ModifyRequest<'a> {
    pub path: &'a AttributePath,
    /// Value from the practitioner's configuration.
    pub config: &'a Json,
    /// Value planned so far.
    pub plan: &'a Json,
    /// Prior state value; `None` when the resource is being created.
    pub state: Option<&'a Json>,
}

/// Result of running a plan modifier.
#[derive(Debug, Clone)]
pub struct ModifyResponse {
    pub plan: Json,
    pub requires_replace: bool,
    pub diagnostics: Diagnostics,
}

impl ModifyResponse {
    fn keep(req: &ModifyRequest<'_>) -> Self {
        Self {
            plan: req.plan.clone(),
            requires_replace: false,
            diagnostics: Diagnostics::new(),
        }
    }
}

pub trait PlanModifier: Send + Sync {
    /// Plain text description of the modifier's behavior.
    fn description(&self) -> String;

    fn modify(&self, req: &ModifyRequest<'_>) -> ModifyResponse;

    /// Value planned for the attribute when the configuration leaves it null.
    fn default_value(&self) -> Option<&Json> {
        None
    }
}

/// True when a planned value has not been decided yet.
fn is_unset(value: &Json) -> bool {
    value.is_null() || is_unknown_json(value)
}

/// Replace an unset planned value with `default`.
pub fn default_if_unset(planned: &Json, default: &Json) -> Json {
    if is_unset(planned) {
        default.clone()
    } else {
        planned.clone()
    }
}

/// Supplies a static default when the planned value is null or unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticDefault {
    value: Json,
}

impl StaticDefault {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: Json::String(value.into()),
        }
    }

    pub fn int64(value: i64) -> Self {
        Self {
            value: Json::from(value),
        }
    }

    pub fn object(value: serde_json::Map<String, Json>) -> Self {
        Self {
            value: Json::Object(value),
        }
    }

    /// Default built from any serializable struct; it must encode as an object.
    pub fn from_object<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(value)? {
            Json::Object(map) => Ok(Self::object(map)),
            other => Err(serde::de::Error::custom(format!(
                "object default must serialize to an object, got {}",
                other
            ))),
        }
    }

    pub fn value(&self) -> &Json {
        &self.value
    }

    fn rendered(&self) -> String {
        match &self.value {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl PlanModifier for StaticDefault {
    fn description(&self) -> String {
        format!("If value is not configured, defaults to {}", self.rendered())
    }

    fn modify(&self, req: &ModifyRequest<'_>) -> ModifyResponse {
        ModifyResponse {
            plan: default_if_unset(req.plan, &self.value),
            requires_replace: false,
            diagnostics: Diagnostics::new(),
        }
    }

    fn default_value(&self) -> Option<&Json> {
        Some(&self.value)
    }
}

/// Keeps the prior state value for an attribute that would otherwise be
/// planned as unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "Once set, the value of this attribute in state will not change.".to_string()
    }

    fn modify(&self, req: &ModifyRequest<'_>) -> ModifyResponse {
        let Some(state) = req.state else {
            return ModifyResponse::keep(req);
        };
        if state.is_null() || !is_unknown_json(req.plan) || is_unknown_json(req.config) {
            return ModifyResponse::keep(req);
        }
        ModifyResponse {
            plan: state.clone(),
            requires_replace: false,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Flags the resource for replacement when the attribute changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiresReplace;

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "If the value of this attribute changes, the resource will be destroyed and recreated."
            .to_string()
    }

    fn modify(&self, req: &ModifyRequest<'_>) -> ModifyResponse {
        let mut resp = ModifyResponse::keep(req);
        if let Some(state) = req.state {
            resp.requires_replace = req.plan != state;
        }
        resp
    }
}

#[cfg(test)]
#[path = "plan_modifiers_tests.rs"]
mod tests;
