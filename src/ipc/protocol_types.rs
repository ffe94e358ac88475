// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wire format types for provider protocol messages.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::provider::{ProviderMetadata, ProviderSchemas};

pub const CURRENT_PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion::V1;
pub const MIN_PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion::V1;

/// Protocol version negotiated during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtocolVersion {
    #[default]
    V1,
}

impl ProtocolVersion {
    pub fn is_supported(&self) -> bool {
        matches!(self, ProtocolVersion::V1)
    }

    pub fn negotiate(client_requested: Option<ProtocolVersion>) -> ProtocolVersion {
        let requested = client_requested.unwrap_or_default();
        if requested.is_supported() {
            requested
        } else {
            CURRENT_PROTOCOL_VERSION
        }
    }
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Error codes carried by [`Message::Error`].
pub mod error_codes {
    pub const BAD_REQUEST: u32 = 400;
    pub const HANDSHAKE_REQUIRED: u32 = 401;
    pub const PAYLOAD_TOO_LARGE: u32 = 413;
    pub const UNEXPECTED_MESSAGE: u32 = 422;
    pub const INTERNAL: u32 = 500;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// A framed message. Responses echo the request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: RequestId,
    pub message: Message,
}

impl Envelope {
    pub fn new(id: RequestId, message: Message) -> Self {
        Self { id, message }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Handshake {
        #[serde(default)]
        protocol_version: Option<ProtocolVersion>,
    },
    HandshakeAck {
        protocol_version: ProtocolVersion,
        provider: ProviderMetadata,
    },
    GetMetadata,
    MetadataResponse(ProviderMetadata),
    GetSchema,
    SchemaResponse(ProviderSchemas),
    Configure {
        #[serde(default)]
        config: Json,
    },
    ConfigureResponse {
        diagnostics: Diagnostics,
    },
    ValidateResourceConfig {
        type_name: String,
        config: Json,
    },
    ValidateDataSourceConfig {
        type_name: String,
        config: Json,
    },
    ValidateResponse {
        diagnostics: Diagnostics,
    },
    PlanResourceChange {
        type_name: String,
        #[serde(default)]
        prior_state: Option<Json>,
        #[serde(default)]
        config: Option<Json>,
    },
    PlanResponse {
        planned_state: Option<Json>,
        #[serde(default)]
        requires_replace: Vec<AttributePath>,
        diagnostics: Diagnostics,
    },
    ApplyResourceChange {
        type_name: String,
        #[serde(default)]
        prior_state: Option<Json>,
        #[serde(default)]
        planned_state: Option<Json>,
    },
    ApplyResponse {
        new_state: Option<Json>,
        diagnostics: Diagnostics,
    },
    ReadResource {
        type_name: String,
        state: Json,
    },
    ReadResourceResponse {
        new_state: Option<Json>,
        diagnostics: Diagnostics,
    },
    ReadDataSource {
        type_name: String,
        config: Json,
    },
    ReadDataSourceResponse {
        state: Option<Json>,
        diagnostics: Diagnostics,
    },
    Stop,
    StopAck,
    Error {
        code: u32,
        message: String,
    },
}

impl Message {
    /// Operation name used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Handshake { .. } => "handshake",
            Message::HandshakeAck { .. } => "handshake_ack",
            Message::GetMetadata => "get_metadata",
            Message::MetadataResponse(_) => "metadata_response",
            Message::GetSchema => "get_schema",
            Message::SchemaResponse(_) => "schema_response",
            Message::Configure { .. } => "configure",
            Message::ConfigureResponse { .. } => "configure_response",
            Message::ValidateResourceConfig { .. } => "validate_resource_config",
            Message::ValidateDataSourceConfig { .. } => "validate_data_source_config",
            Message::ValidateResponse { .. } => "validate_response",
            Message::PlanResourceChange { .. } => "plan_resource_change",
            Message::PlanResponse { .. } => "plan_response",
            Message::ApplyResourceChange { .. } => "apply_resource_change",
            Message::ApplyResponse { .. } => "apply_response",
            Message::ReadResource { .. } => "read_resource",
            Message::ReadResourceResponse { .. } => "read_resource_response",
            Message::ReadDataSource { .. } => "read_data_source",
            Message::ReadDataSourceResponse { .. } => "read_data_source_response",
            Message::Stop => "stop",
            Message::StopAck => "stop_ack",
            Message::Error { .. } => "error",
        }
    }

    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Message::Error {
            code,
            message: message.into(),
        }
    }

    /// Diagnostics carried by a response, if any.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Message::ConfigureResponse { diagnostics }
            | Message::ValidateResponse { diagnostics }
            | Message::PlanResponse { diagnostics, .. }
            | Message::ApplyResponse { diagnostics, .. }
            | Message::ReadResourceResponse { diagnostics, .. }
            | Message::ReadDataSourceResponse { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}
