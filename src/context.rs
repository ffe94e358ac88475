// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-operation context carrying cancellation.

use tokio_util::sync::CancellationToken;

/// Passed through every lifecycle call and every k3d call.
///
/// When the host asks the provider to stop, the token is cancelled; running
/// k3d commands are killed and report [`crate::k3d::K3dError::Cancelled`].
/// After a cancelled operation the cluster's existence is unknown until the
/// next read.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
}

impl OpContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Context cancelled together with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
