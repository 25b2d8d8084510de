//! CalRelay - calendar push notification relay
//!
//! Main entry point for the gateway binary.

use std::sync::Arc;

use anyhow::Context;
use calrelay_api::utils::init_tracing;
use calrelay_api::{serve, AppContext};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber reads RUST_LOG
    let dotenv = dotenvy::dotenv();
    init_tracing();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "could not load .env file"),
    }

    let config = calrelay_infra::config::load().context("failed to load configuration")?;
    let bind_addr = config.server.bind_addr.clone();

    let context = Arc::new(AppContext::new(config).context("failed to build application context")?);
    let listener =
        TcpListener::bind(&bind_addr).await.with_context(|| format!("failed to bind {bind_addr}"))?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown requested");
        signal.cancel();
    });

    serve(context, listener, shutdown).await.context("gateway server error")?;
    Ok(())
}
