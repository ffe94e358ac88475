// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host protocol: framing, message types and dispatch.

pub mod handler;
pub mod protocol;
mod protocol_codec;
mod protocol_types;
pub mod server;

pub use handler::ProviderHandler;
pub use protocol::{
    decode_message, encode_message, encode_response, error_codes, Envelope, Message,
    ProtocolError, ProtocolVersion, RequestId, CURRENT_PROTOCOL_VERSION, MAX_MESSAGE_SIZE,
};
pub use server::{read_frame, run_stdio, serve, write_frame, ServerError};
