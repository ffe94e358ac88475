// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wire format for provider messages.
//!
//! - `protocol_types`: message types and errors
//! - `protocol_codec`: size-limited encode/decode

pub use super::protocol_codec::*;
pub use super::protocol_types::*;

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
