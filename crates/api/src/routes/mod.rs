//! HTTP routes of the notification gateway

mod admin;
mod health;
mod push;
mod watch;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use calrelay_domain::CalRelayError;
use serde_json::json;

use crate::context::AppContext;

pub use push::{CHANNEL_ID_HEADER, RESOURCE_STATE_HEADER};

/// Shared handler state.
pub type AppState = Arc<AppContext>;

/// Build the gateway router over an application context.
pub fn router(context: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/init_watch", post(watch::init_watch))
        .route("/stop_watch", post(watch::stop_watch))
        .route("/calendar/push", post(push::calendar_push))
        .route("/subscriptions", get(admin::list_subscriptions))
        .route("/resources/{resource}/reset", post(admin::reset_resource))
        .with_state(context)
}

/// `{"ok": false, "error": ...}` body with a status derived from the error.
#[derive(Debug)]
pub struct ApiError(CalRelayError);

impl From<CalRelayError> for ApiError {
    fn from(err: CalRelayError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            CalRelayError::Config(_) | CalRelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CalRelayError::NotFound(_) => StatusCode::NOT_FOUND,
            CalRelayError::Auth(_) | CalRelayError::Network(_) | CalRelayError::Provider(_) => {
                StatusCode::BAD_GATEWAY
            }
            CalRelayError::Storage(_)
            | CalRelayError::CursorExpired(_)
            | CalRelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message without the variant prefix.
    fn message(&self) -> &str {
        match &self.0 {
            CalRelayError::Storage(msg)
            | CalRelayError::Config(msg)
            | CalRelayError::Network(msg)
            | CalRelayError::Auth(msg)
            | CalRelayError::NotFound(msg)
            | CalRelayError::InvalidInput(msg)
            | CalRelayError::Provider(msg)
            | CalRelayError::CursorExpired(msg)
            | CalRelayError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "ok": false, "error": self.message(), "kind": self.0.label() });
        (self.status(), Json(body)).into_response()
    }
}
