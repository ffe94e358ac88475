// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request dispatch from protocol messages to the provider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::protocol::{
    decode_message, encode_response, error_codes, Envelope, Message, ProtocolError,
    ProtocolVersion, RequestId,
};
use crate::context::OpContext;
use crate::provider::K3dProvider;

pub struct ProviderHandler {
    provider: Arc<K3dProvider>,
    ctx: OpContext,
    handshake_done: AtomicBool,
}

impl ProviderHandler {
    pub fn new(provider: Arc<K3dProvider>, ctx: OpContext) -> Self {
        Self {
            provider,
            ctx,
            handshake_done: AtomicBool::new(false),
        }
    }

    /// Context shared by every operation; cancelled on `stop`.
    pub fn context(&self) -> &OpContext {
        &self.ctx
    }

    /// Decode one frame, dispatch it, and encode the response.
    pub async fn process(&self, bytes: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let response = match decode_message(bytes) {
            Ok(envelope) => self.handle(envelope).await,
            Err(e) => {
                warn!(error = %e, "Rejecting malformed request");
                Envelope::new(
                    RequestId::default(),
                    Message::error(error_codes::BAD_REQUEST, e.to_string()),
                )
            }
        };
        encode_response(&response)
    }

    pub async fn handle(&self, envelope: Envelope) -> Envelope {
        let Envelope { id, message } = envelope;
        let operation = message.kind();
        let started = Instant::now();

        let response = self.dispatch(message).await;

        let outcome = match &response {
            Message::Error { .. } => "error",
            other if other.diagnostics().map_or(false, |d| d.has_error()) => "failed",
            _ => "ok",
        };
        metrics::counter!("k3d_provider_requests_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("k3d_provider_request_duration_seconds", "operation" => operation)
            .record(started.elapsed().as_secs_f64());
        debug!(id = id.0, operation, outcome, elapsed_ms = started.elapsed().as_millis() as u64, "Handled request");

        Envelope::new(id, response)
    }

    async fn dispatch(&self, message: Message) -> Message {
        if let Message::Handshake { protocol_version } = message {
            let version = ProtocolVersion::negotiate(protocol_version);
            self.handshake_done.store(true, Ordering::SeqCst);
            info!(?version, "Handshake complete");
            return Message::HandshakeAck {
                protocol_version: version,
                provider: self.provider.metadata(),
            };
        }
        if message == Message::Stop {
            info!("Stop requested, cancelling in-flight operations");
            self.ctx.cancel();
            return Message::StopAck;
        }
        if !self.handshake_done.load(Ordering::SeqCst) {
            return Message::error(error_codes::HANDSHAKE_REQUIRED, "Handshake required");
        }

        match message {
            Message::GetMetadata => Message::MetadataResponse(self.provider.metadata()),
            Message::GetSchema => Message::SchemaResponse(self.provider.schemas()),
            Message::Configure { config } => Message::ConfigureResponse {
                diagnostics: self.provider.configure(&config),
            },
            Message::ValidateResourceConfig { type_name, config } => Message::ValidateResponse {
                diagnostics: self.provider.validate_resource_config(&type_name, &config),
            },
            Message::ValidateDataSourceConfig { type_name, config } => Message::ValidateResponse {
                diagnostics: self.provider.validate_data_source_config(&type_name, &config),
            },
            Message::PlanResourceChange {
                type_name,
                prior_state,
                config,
            } => {
                let (plan, diagnostics) = self
                    .provider
                    .plan_resource_change(&type_name, prior_state.as_ref(), config.as_ref())
                    .into_parts();
                let (planned_state, requires_replace) = match plan {
                    Some(plan) => (plan.planned_state, plan.requires_replace),
                    None => (None, Vec::new()),
                };
                Message::PlanResponse {
                    planned_state,
                    requires_replace,
                    diagnostics,
                }
            }
            Message::ApplyResourceChange {
                type_name,
                prior_state,
                planned_state,
            } => {
                let ctx = self.ctx.child();
                let (new_state, diagnostics) = self
                    .provider
                    .apply_resource_change(&ctx, &type_name, prior_state.as_ref(), planned_state.as_ref())
                    .await
                    .into_parts();
                Message::ApplyResponse {
                    new_state: new_state.flatten(),
                    diagnostics,
                }
            }
            Message::ReadResource { type_name, state } => {
                let ctx = self.ctx.child();
                let (new_state, diagnostics) = self
                    .provider
                    .read_resource(&ctx, &type_name, &state)
                    .await
                    .into_parts();
                Message::ReadResourceResponse {
                    new_state,
                    diagnostics,
                }
            }
            Message::ReadDataSource { type_name, config } => {
                let ctx = self.ctx.child();
                let (state, diagnostics) = self
                    .provider
                    .read_data_source(&ctx, &type_name, &config)
                    .await
                    .into_parts();
                Message::ReadDataSourceResponse { state, diagnostics }
            }
            other => Message::error(
                error_codes::UNEXPECTED_MESSAGE,
                format!("Unexpected message type: {}", other.kind()),
            ),
        }
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
