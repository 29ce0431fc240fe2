// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

use tokio_util::sync::CancellationToken;

use veralix_certificate_service::{
    api::router, config::ServiceConfig, init_tracing, state::AppState,
    storage::CertificateDatabase,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_format);

    let db = CertificateDatabase::open(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), "Certificate database opened");

    let bind = (config.host.clone(), config.port);
    tracing::info!(
        network = config.network().label,
        registry = config.registry_address(),
        oriluxchain = %config.oriluxchain_api_url,
        signer_configured = config.signer.private_key.is_some(),
        "Configuration loaded"
    );

    let state = AppState::from_config(config, db)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "Veralix certificate service listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
