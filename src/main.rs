// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use wornvault_guard::{api::router, config::GuardConfig, state::AppState, telemetry::init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match GuardConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(config.log_format) {
        eprintln!("Failed to initialize tracing: {err}");
        return ExitCode::FAILURE;
    }

    let bind_address = config.bind_address();
    tracing::info!(
        csrf_signed = config.csrf_secret.is_some(),
        rate_limit_enabled = config.rate_limit_enabled,
        trust_proxy_headers = config.trust_proxy_headers,
        "Configuration loaded"
    );

    let app = router(AppState::new(config));

    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(address = %bind_address, error = %err, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(address = %bind_address, "WornVault Guard listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await;

    match served {
        Ok(()) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn wait_for_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
    shutdown.cancel();
}
