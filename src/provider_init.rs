// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider startup and stdio server setup.

use std::sync::Arc;
use std::time::Duration;

use k3d_provider::config::{ConfigError, ProviderConfig};
use k3d_provider::ipc::{self, ProviderHandler};
use k3d_provider::{K3dProvider, OpContext};
use tracing::{info, warn};

/// Time an interrupted server gets to finish the current request.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Load configuration and install the tracing subscriber.
pub fn init() -> Result<ProviderConfig, ConfigError> {
    let config = ProviderConfig::load()?;
    k3d_provider::logging::init(&config.log);
    Ok(config)
}

/// Serve the host protocol until the host stops the provider, closes stdin,
/// or the process is interrupted.
pub async fn run_provider(config: ProviderConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.backend,
        "Starting k3d provider"
    );
    let provider = Arc::new(K3dProvider::from_config(config));
    let ctx = OpContext::new();
    let handler = Arc::new(ProviderHandler::new(provider, ctx.clone()));

    let mut server = tokio::spawn(ipc::run_stdio(handler));

    let result = tokio::select! {
        result = &mut server => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            warn!("Interrupt received, cancelling in-flight operations");
            ctx.cancel();
            match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
                Ok(joined) => joined?,
                Err(_) => {
                    warn!("Server did not finish in time after interrupt");
                    Ok(())
                }
            }
        }
    };
    result?;

    info!("Provider exited");
    Ok(())
}
