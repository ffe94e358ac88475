// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Schema model shared by resources and data sources.
//!
//! Declares accepted and computed attributes, the validators and plan
//! modifiers attached to each, and the plan computation that runs them.

pub mod plan;
pub mod plan_modifiers;
pub mod types;
pub mod validators;

pub use plan::{plan_resource_change, validate_config, PlannedChange};
pub use plan_modifiers::{ModifyRequest, ModifyResponse, PlanModifier, RequiresReplace, StaticDefault, UseStateForUnknown};
pub use types::{Attribute, AttributeDescriptor, AttributeType, Schema, SchemaDescriptor};
pub use validators::{
    AttributeValidator, IpValidator, LengthBetween, PortValidator, RegexMatches, ValidationError,
};
