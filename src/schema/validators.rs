// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Attribute validators.
//!
//! Null and unknown values always pass: they are checked again once known.
//! A failing validator reports an attribute-scoped diagnostic and never stops
//! sibling attributes from being validated.

use std::net::Ipv4Addr;

use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::diagnostics::{AttributePath, Diagnostic, DiagnosticCode, Diagnostics};
use crate::value::AttrValue;

/// Lowest valid TCP port.
pub const MIN_PORT: i64 = 1;

/// Highest valid TCP port.
pub const MAX_PORT: i64 = 65535;

/// Validation error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Port outside 1-65535.
    #[error("{0}")]
    PortOutOfRange(i64),
    /// Not a dotted-quad IPv4 address.
    #[error("{0}")]
    InvalidIpv4(String),
    /// String length outside the accepted bounds.
    #[error("length {len} not between {min} and {max}")]
    LengthOutOfRange { len: usize, min: usize, max: usize },
    /// String does not match the required pattern.
    #[error("{message}: {value}")]
    PatternMismatch { value: String, message: String },
    /// Value has the wrong JSON type.
    #[error("expected {expected}: {detail}")]
    TypeMismatch { expected: &'static str, detail: String },
}

/// A validator attached to a schema attribute.
pub trait AttributeValidator: Send + Sync {
    /// Plain text description of what the validator accepts.
    fn description(&self) -> String;

    /// Validate the raw configuration value at `path`.
    fn validate(&self, path: &AttributePath, value: &serde_json::Value) -> Diagnostics;
}

/// Diagnostic for a value that failed a validator.
pub fn invalid_attribute_value(
    path: &AttributePath,
    description: &str,
    value: impl std::fmt::Display,
) -> Diagnostic {
    Diagnostic::error(
        "Invalid Attribute Value",
        format!("Attribute {} {}, got: {}", path, description, value),
    )
    .at(path.clone())
    .with_code(DiagnosticCode::ValidationFailure)
}

/// Decode `value` and run `check` on it, turning failures into diagnostics.
fn run_check<T, F>(
    path: &AttributePath,
    description: &str,
    expected: &'static str,
    value: &serde_json::Value,
    check: F,
) -> Diagnostics
where
    T: DeserializeOwned,
    F: FnOnce(&AttrValue<T>) -> Result<(), ValidationError>,
{
    let mut diags = Diagnostics::new();
    let decoded = match AttrValue::<T>::from_json(value) {
        Ok(decoded) => decoded,
        Err(e) => {
            let err = ValidationError::TypeMismatch {
                expected,
                detail: e.to_string(),
            };
            diags.push(
                Diagnostic::error("Invalid Attribute Type", err.to_string())
                    .at(path.clone())
                    .with_code(DiagnosticCode::ValidationFailure),
            );
            return diags;
        }
    };

    if let Err(e) = check(&decoded) {
        diags.push(invalid_attribute_value(path, description, e));
    }
    diags
}

/// Accepts ports in the range 1-65535.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortValidator;

impl PortValidator {
    pub fn check(&self, value: &AttrValue<i64>) -> Result<(), ValidationError> {
        match value {
            AttrValue::Known(port) if !(MIN_PORT..=MAX_PORT).contains(port) => {
                Err(ValidationError::PortOutOfRange(*port))
            }
            _ => Ok(()),
        }
    }
}

impl AttributeValidator for PortValidator {
    fn description(&self) -> String {
        "A valid port in the range of 1-65535".to_string()
    }

    fn validate(&self, path: &AttributePath, value: &serde_json::Value) -> Diagnostics {
        run_check::<i64, _>(path, &self.description(), "integer", value, |v| self.check(v))
    }
}

/// Accepts IPv4 addresses in dotted-quad notation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpValidator;

impl IpValidator {
    pub fn check(&self, value: &AttrValue<String>) -> Result<(), ValidationError> {
        match value {
            AttrValue::Known(ip) if ip.parse::<Ipv4Addr>().is_err() => {
                Err(ValidationError::InvalidIpv4(ip.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl AttributeValidator for IpValidator {
    fn description(&self) -> String {
        "A valid IPv4 address in dotted-quad notation".to_string()
    }

    fn validate(&self, path: &AttributePath, value: &serde_json::Value) -> Diagnostics {
        run_check::<String, _>(path, &self.description(), "string", value, |v| self.check(v))
    }
}

/// Accepts strings whose character count lies within `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct LengthBetween {
    pub min: usize,
    pub max: usize,
}

impl LengthBetween {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn check(&self, value: &AttrValue<String>) -> Result<(), ValidationError> {
        if let AttrValue::Known(s) = value {
            let len = s.chars().count();
            if len < self.min || len > self.max {
                return Err(ValidationError::LengthOutOfRange {
                    len,
                    min: self.min,
                    max: self.max,
                });
            }
        }
        Ok(())
    }
}

impl AttributeValidator for LengthBetween {
    fn description(&self) -> String {
        format!(
            "string length must be between {} and {}",
            self.min, self.max
        )
    }

    fn validate(&self, path: &AttributePath, value: &serde_json::Value) -> Diagnostics {
        run_check::<String, _>(path, &self.description(), "string", value, |v| self.check(v))
    }
}

/// Accepts strings matching a regular expression.
#[derive(Debug, Clone)]
pub struct RegexMatches {
    regex: Regex,
    message: String,
}

impl RegexMatches {
    pub fn new(regex: Regex, message: impl Into<String>) -> Self {
        Self {
            regex,
            message: message.into(),
        }
    }

    pub fn check(&self, value: &AttrValue<String>) -> Result<(), ValidationError> {
        match value {
            AttrValue::Known(s) if !self.regex.is_match(s) => Err(ValidationError::PatternMismatch {
                value: s.clone(),
                message: self.message.clone(),
            }),
            _ => Ok(()),
        }
    }
}

impl AttributeValidator for RegexMatches {
    fn description(&self) -> String {
        if self.message.is_empty() {
            format!("value must match regular expression '{}'", self.regex)
        } else {
            self.message.clone()
        }
    }

    fn validate(&self, path: &AttributePath, value: &serde_json::Value) -> Diagnostics {
        run_check::<String, _>(path, &self.description(), "string", value, |v| self.check(v))
    }
}

#[cfg(test)]
#[path = "validators_tests.rs"]
mod tests;
