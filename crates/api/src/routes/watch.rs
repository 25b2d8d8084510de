//! Subscription lifecycle endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use calrelay_domain::CalRelayError;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{ApiError, AppState};

/// Bootstrap every configured calendar and open a push channel for it.
///
/// Missing callback address or resources is a 400 and touches no state.
/// Per-resource failures are reported in `failed` without aborting the batch.
#[instrument(skip_all)]
pub(super) async fn init_watch(State(context): State<AppState>) -> Result<Response, ApiError> {
    let report = context.watch.start_watching().await.map_err(|err| {
        warn!(error = %err, kind = err.label(), "init_watch rejected");
        ApiError::from(err)
    })?;

    info!(started = report.started.len(), failed = report.failed.len(), "init_watch finished");
    let body = json!({ "ok": true, "started": report.started, "failed": report.failed });
    Ok(Json(body).into_response())
}

/// Stop every known push channel.
#[instrument(skip_all)]
pub(super) async fn stop_watch(State(context): State<AppState>) -> Result<Response, ApiError> {
    match context.watch.stop_watching().await {
        Ok(stopped) => Ok(Json(json!({ "ok": true, "stopped": stopped })).into_response()),
        Err(CalRelayError::NotFound(msg)) => {
            Ok((StatusCode::OK, Json(json!({ "ok": false, "error": msg }))).into_response())
        }
        Err(err) => {
            warn!(error = %err, kind = err.label(), "stop_watch failed");
            Err(err.into())
        }
    }
}
