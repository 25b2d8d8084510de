//! Operator endpoints

use axum::extract::{Path, State};
use axum::Json;
use calrelay_domain::ResourceId;
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{ApiError, AppState};

#[instrument(skip_all)]
pub(super) async fn list_subscriptions(State(context): State<AppState>) -> Result<Json<Value>, ApiError> {
    let subscriptions = context.watch.subscriptions().await?;
    Ok(Json(json!({ "ok": true, "subscriptions": subscriptions })))
}

/// Forget a calendar's cursor; the next push re-establishes a baseline.
#[instrument(skip_all, fields(resource = %resource))]
pub(super) async fn reset_resource(
    State(context): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let resource = ResourceId::from(resource);
    context.watch.reset_resource(&resource).await?;

    info!("resource reset requested");
    Ok(Json(json!({ "ok": true, "resource": resource })))
}
