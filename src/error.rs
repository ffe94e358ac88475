// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::k3d::K3dError;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unknown data source type: {0}")]
    UnknownDataSourceType(String),

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("k3d error: {0}")]
    K3d(#[from] K3dError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ProviderError {
    pub fn decode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { what, source }
    }

    pub fn encode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Encode { what, source }
    }

    /// Render the error as a single error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UnknownResourceType(_) | Self::UnknownDataSourceType(_) => {
                Diagnostic::error("Unsupported type", self.to_string())
                    .with_code(DiagnosticCode::Unsupported)
            }
            Self::Decode { .. } | Self::Encode { .. } => {
                Diagnostic::error("Unable to convert value", self.to_string())
                    .with_code(DiagnosticCode::Decode)
            }
            Self::K3d(_) => Diagnostic::error("k3d operation failed", self.to_string())
                .with_code(DiagnosticCode::ExternalOperationFailure),
            Self::Config(_) => Diagnostic::error("Invalid provider configuration", self.to_string()),
        }
    }
}
