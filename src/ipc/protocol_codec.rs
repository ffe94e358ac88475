// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Encode/decode functions for protocol messages.
//!
//! Enforces a maximum message size in both directions.

use super::protocol_types::{error_codes, Envelope, Message, ProtocolError};

pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16 MB

/// Encode an envelope to JSON bytes with size limit enforcement.
pub fn encode_message(envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
    let bytes = serde_json::to_vec(envelope)?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: bytes.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(bytes)
}

/// Encode a response. An oversized response is replaced by an error
/// response carrying the same id.
pub fn encode_response(envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
    let bytes = serde_json::to_vec(envelope)?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        let error_response = Envelope::new(
            envelope.id,
            Message::error(
                error_codes::PAYLOAD_TOO_LARGE,
                format!(
                    "Response too large: {} bytes (max {})",
                    bytes.len(),
                    MAX_MESSAGE_SIZE
                ),
            ),
        );
        return encode_message(&error_response);
    }
    Ok(bytes)
}

/// Decode an envelope from JSON bytes with size limit enforcement.
pub fn decode_message(bytes: &[u8]) -> Result<Envelope, ProtocolError> {
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: bytes.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(serde_json::from_slice(bytes)?)
}
