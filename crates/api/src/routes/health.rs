use axum::Json;
use serde_json::{json, Value};

/// Liveness probe.
pub(super) async fn root() -> Json<Value> {
    Json(json!({ "ok": true, "msg": "calendar push relay running" }))
}
