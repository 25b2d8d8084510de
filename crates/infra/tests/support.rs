//! Shared helpers for `calrelay-infra` integration tests.

#![allow(dead_code)]

use std::time::Duration;

use calrelay_domain::{ChangeItem, DiffEvent, DiffKind, ResourceId};
use calrelay_infra::HttpClient;
use serde_json::{json, Value};

/// Client with fast read retries for mock servers.
pub fn fast_client(read_attempts: usize) -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .read_attempts(read_attempts)
        .backoff(Duration::from_millis(1))
        .build()
        .expect("http client")
}

/// An `events.list` response body.
pub fn events_page(items: Vec<Value>, next_page_token: Option<&str>, next_sync_token: Option<&str>) -> Value {
    let mut body = json!({ "kind": "calendar#events", "items": items });
    if let Some(token) = next_page_token {
        body["nextPageToken"] = json!(token);
    }
    if let Some(token) = next_sync_token {
        body["nextSyncToken"] = json!(token);
    }
    body
}

pub fn event(id: &str, etag: &str, summary: &str) -> Value {
    json!({
        "id": id,
        "etag": etag,
        "status": "confirmed",
        "summary": summary,
        "start": { "dateTime": "2026-03-02T09:00:00Z" },
        "end": { "dateTime": "2026-03-02T09:30:00Z" }
    })
}

pub fn cancelled(id: &str) -> Value {
    json!({ "id": id, "status": "cancelled" })
}

pub fn created_event(resource: &str, item_id: &str) -> DiffEvent {
    let mut item = ChangeItem::active(item_id, "\"e1\"");
    item.summary = Some("Standup".into());
    DiffEvent::from_item(&ResourceId::new(resource), DiffKind::Created, &item)
}
