// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Operator commands run outside the host protocol.

pub mod config_cmd;
pub mod nodes_cmd;
pub mod nodes_format;

/// Exit codes shared by all commands.
pub mod exit {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}
