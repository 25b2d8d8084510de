//! Provider push callback

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use calrelay_core::NotificationOutcome;
use tracing::{debug, instrument};

use super::AppState;

/// Channel id echoed back by the provider.
pub const CHANNEL_ID_HEADER: &str = "x-goog-channel-id";

/// Resource state of the push (`sync`, `exists`, `not_exists`).
pub const RESOURCE_STATE_HEADER: &str = "x-goog-resource-state";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::trim)
}

/// Acknowledge a push and sync the calendar it refers to.
///
/// Always answers 200: sync failures are logged and the next push retries.
#[instrument(skip_all, fields(channel_id, resource_state))]
pub(super) async fn calendar_push(State(context): State<AppState>, headers: HeaderMap) -> StatusCode {
    let channel_id = header_str(&headers, CHANNEL_ID_HEADER);
    let resource_state = header_str(&headers, RESOURCE_STATE_HEADER);

    let span = tracing::Span::current();
    span.record("channel_id", channel_id.unwrap_or_default());
    span.record("resource_state", resource_state.unwrap_or_default());

    match context.watch.handle_notification(channel_id, resource_state).await {
        NotificationOutcome::Ignored => debug!("push acknowledged without work"),
        NotificationOutcome::Dispatched { resource_id, outcome } => {
            debug!(resource = %resource_id, ?outcome, "push dispatched");
        }
    }

    StatusCode::OK
}
