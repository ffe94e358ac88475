// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config validation and plan computation over a schema.

use serde_json::{Map, Value as Json};

use super::plan_modifiers::ModifyRequest;
use super::types::{Attribute, Schema};
use crate::diagnostics::{AttributePath, Diagnostic, DiagnosticCode, Diagnostics, Outcome};
use crate::value::unknown_json;

/// Planned post-apply state and the attributes forcing replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    /// `None` when the resource is planned for destruction.
    pub planned_state: Option<Json>,
    pub requires_replace: Vec<AttributePath>,
}

fn as_object<'a>(value: &'a Json, what: &str, diags: &mut Diagnostics) -> Option<&'a Map<String, Json>> {
    match value {
        Json::Object(map) => Some(map),
        other => {
            diags.push(
                Diagnostic::error(
                    format!("Invalid {}", what),
                    format!("expected an object, got {}", other),
                )
                .with_code(DiagnosticCode::Decode),
            );
            None
        }
    }
}

/// Check a configuration object against a schema.
///
/// Reports missing required attributes, attributes the schema does not
/// declare or does not allow to be set, values of the wrong type, and every
/// validator failure. Validators are skipped for a value of the wrong type.
pub fn validate_config(schema: &Schema, config: &Json) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let Some(config) = as_object(config, "configuration", &mut diags) else {
        return diags;
    };

    for key in config.keys() {
        let path = AttributePath::root(key.as_str());
        match schema.get(key) {
            None => diags.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here.", key),
                )
                .at(path)
                .with_code(DiagnosticCode::ValidationFailure),
            ),
            Some(attr) if !attr.is_configurable() && !config[key].is_null() => diags.push(
                Diagnostic::error(
                    "Invalid Configuration for Read-Only Attribute",
                    format!("Cannot set value for this attribute as the provider has marked it as read-only. Remove the configuration line setting the value.\n\nRefer to the provider documentation or contact the provider developers for additional information about configurable and read-only attributes that are supported.\n\nAttribute: {}", key),
                )
                .at(path)
                .with_code(DiagnosticCode::ValidationFailure),
            ),
            Some(_) => {}
        }
    }

    for (name, attr) in &schema.attributes {
        let path = AttributePath::root(name.as_str());
        let value = config.get(name).unwrap_or(&Json::Null);

        if attr.required && value.is_null() {
            diags.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!("The argument \"{}\" is required, but no definition was found.", name),
                )
                .at(path.clone())
                .with_code(DiagnosticCode::ValidationFailure),
            );
            continue;
        }

        if !attr.attr_type.accepts(value) {
            diags.push(
                Diagnostic::error(
                    "Incorrect attribute value type",
                    format!(
                        "Inappropriate value for attribute \"{}\": {} required, got {}.",
                        name,
                        attr.attr_type.type_name(),
                        value
                    ),
                )
                .at(path)
                .with_code(DiagnosticCode::ValidationFailure),
            );
            continue;
        }

        for validator in &attr.validators {
            diags.extend(validator.validate(&path, value));
        }
    }

    diags
}

/// Configured value, or the attribute's static default when the
/// configuration leaves it null.
fn effective_config(attr: &Attribute, configured: &Json) -> Json {
    match attr.default_value() {
        Some(default) if configured.is_null() => default.clone(),
        _ => configured.clone(),
    }
}

/// Compute the planned state for a resource.
///
/// `config` of `None` plans destruction. An attribute the configuration
/// leaves null is planned at its static default when it has one, so removing
/// an explicit setting returns it to the default. Other computed attributes
/// left null become unknown when the resource is created or a configured
/// value changed; otherwise they carry their prior value.
pub fn plan_resource_change(
    schema: &Schema,
    prior_state: Option<&Json>,
    config: Option<&Json>,
) -> Outcome<PlannedChange> {
    let Some(config) = config else {
        return Outcome::ok(PlannedChange {
            planned_state: None,
            requires_replace: Vec::new(),
        });
    };

    let mut diags = validate_config(schema, config);
    if diags.has_error() {
        return Outcome::failed(diags);
    }

    let empty = Map::new();
    let config = config.as_object().unwrap_or(&empty);
    let prior = match prior_state {
        Some(state) if !state.is_null() => match as_object(state, "prior state", &mut diags) {
            Some(map) => Some(map),
            None => return Outcome::failed(diags),
        },
        _ => None,
    };

    let changed = match prior {
        None => true,
        Some(prior) => schema.attributes.iter().any(|(name, attr)| {
            let value = effective_config(attr, config.get(name).unwrap_or(&Json::Null));
            attr.is_configurable() && !value.is_null() && prior.get(name) != Some(&value)
        }),
    };

    let mut planned = Map::new();
    for (name, attr) in &schema.attributes {
        let configured = effective_config(attr, config.get(name).unwrap_or(&Json::Null));
        let value = if configured.is_null() && attr.computed {
            if changed {
                unknown_json()
            } else {
                prior
                    .and_then(|p| p.get(name).cloned())
                    .unwrap_or(Json::Null)
            }
        } else {
            configured
        };
        planned.insert(name.clone(), value);
    }

    let mut requires_replace = Vec::new();
    for (name, attr) in &schema.attributes {
        let path = AttributePath::root(name.as_str());
        let configured = config.get(name).unwrap_or(&Json::Null);
        let state = prior.map(|p| p.get(name).unwrap_or(&Json::Null));

        for modifier in &attr.plan_modifiers {
            let current = planned.get(name).cloned().unwrap_or(Json::Null);
            let resp = modifier.modify(&ModifyRequest {
                path: &path,
                config: configured,
                plan: &current,
                state,
            });
            diags.extend(resp.diagnostics);
            if resp.requires_replace && !requires_replace.contains(&path) {
                requires_replace.push(path.clone());
            }
            planned.insert(name.clone(), resp.plan);
        }
    }

    Outcome::with_value(
        PlannedChange {
            planned_state: Some(Json::Object(planned)),
            requires_replace,
        },
        diags,
    )
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
