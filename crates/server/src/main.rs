//! `pendientes-svc` — binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing, optionally OTLP).
//! 3. Load the PIN encryption key.
//! 4. Open the student database, creating or upgrading its table.
//! 5. Build the Axum router and serve until Ctrl-C.

mod config;
mod crypto;
mod import;
mod portal;
mod query;
mod server;
mod store;
mod telemetry;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use anyhow::Result;
use common::ServiceError;
use tracing::info;

use config::Config;
use crypto::{CredentialCipher, SecretKey};
use portal::PortalClient;
use server::state::AppState;
use store::StudentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        "pendientes-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Encryption key
    // -----------------------------------------------------------------------
    let key = SecretKey::from_bytes(cfg.secret_key.as_bytes())
        .map_err(|e| ServiceError::Configuration(e.to_string()))?;
    let cipher = CredentialCipher::new(key);

    // -----------------------------------------------------------------------
    // 4. Student database
    // -----------------------------------------------------------------------
    let store = StudentStore::open(&cfg.database_path).await?;
    info!(
        path = %cfg.database_path,
        students = store.count().await?,
        "student database ready"
    );

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let portal_timeout = Duration::from_secs(cfg.portal_timeout_secs);
    let portal = PortalClient::new(cfg.portal_base_url.clone(), portal_timeout);
    let state = AppState::new(store.clone(), cipher, portal);
    let router = server::router::build(state, portal_timeout);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("pendientes-svc stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
