// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Signal handling for graceful shutdown.

use tracing::{error, info};

/// Waits for SIGINT, SIGTERM or SIGQUIT.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigint), Ok(mut sigterm), Ok(mut sigquit)) = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    ) else {
        error!("Failed to install signal handlers, only Ctrl-C will stop the shipper");
        ctrl_c().await;
        return;
    };

    tokio::select! {
        _ = sigint.recv() => info!("Signal received: SIGINT"),
        _ = sigterm.recv() => info!("Signal received: SIGTERM"),
        _ = sigquit.recv() => info!("Signal received: SIGQUIT"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Signal received: Ctrl-C"),
        Err(e) => {
            error!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
