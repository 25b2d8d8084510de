//! Serve loop for the gateway

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::context::AppContext;
use crate::routes::router;

/// Serve the gateway on `listener` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(
    context: Arc<AppContext>,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "gateway listening");

    axum::serve(listener, router(context))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("gateway stopped");
    Ok(())
}
