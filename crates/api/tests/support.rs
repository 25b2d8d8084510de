//! Shared helpers for `calrelay-api` integration tests.
//!
//! A [`Gateway`] wires the real router, file stores and Google adapter to a
//! temporary directory and a mock Calendar API.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use calrelay_api::context::Adapters;
use calrelay_api::{router, AppContext};
use calrelay_core::DiffSink;
use calrelay_domain::{CalRelayError, Config, DiffEvent, DiffKind, Result};
use calrelay_infra::{FileStateStore, FileSubscriptionRegistry, GoogleCalendarFeed, HttpClient};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CALLBACK: &str = "https://relay.example.com/calendar/push";

/// Diff sink that keeps every delivered event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiffEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DiffEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<(String, DiffKind)> {
        self.events().into_iter().map(|e| (e.item_id, e.kind)).collect()
    }
}

#[async_trait]
impl DiffSink for RecordingSink {
    async fn deliver(&self, event: &DiffEvent) -> Result<()> {
        self.events.lock().map_err(|_| CalRelayError::Internal("poisoned".into()))?.push(event.clone());
        Ok(())
    }
}

pub struct Gateway {
    pub router: Router,
    pub context: Arc<AppContext>,
    pub sink: Arc<RecordingSink>,
    pub server: MockServer,
    pub dir: TempDir,
}

impl Gateway {
    pub async fn start(resources: &[&str], callback: Option<&str>) -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("tempdir");

        let mut config = Config::default();
        config.resources = resources.iter().map(|r| (*r).to_string()).collect();
        config.server.callback_address = callback.map(str::to_string);
        config.provider.api_base = server.uri();
        config.storage.state_dir = dir.path().join("calendar_states");
        config.storage.channels_file = dir.path().join("channels.json");

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(5))
            .read_attempts(1)
            .build()
            .expect("http client");
        let feed = Arc::new(GoogleCalendarFeed::new(http, &server.uri(), Some("test-token".into())).expect("feed"));
        let sink = Arc::new(RecordingSink::default());

        let adapters = Adapters {
            provider: feed.clone(),
            watcher: feed,
            store: Arc::new(FileStateStore::new(config.storage.state_dir.clone())),
            registry: Arc::new(FileSubscriptionRegistry::new(config.storage.channels_file.clone())),
            sink: sink.clone(),
        };
        let context = Arc::new(AppContext::from_parts(config, adapters));

        Self { router: router(context.clone()), context, sink, server, dir }
    }

    pub async fn call(&self, method: Method, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).expect("request");

        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
        (status, body)
    }

    pub async fn post(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::POST, uri, &[]).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, &[]).await
    }

    pub async fn push(&self, channel_id: &str, state: &str) -> StatusCode {
        let headers = [("X-Goog-Channel-ID", channel_id), ("X-Goog-Resource-State", state)];
        let status = self.call(Method::POST, "/calendar/push", &headers).await.0;
        self.context.engine.flush_deliveries().await;
        status
    }

    pub fn state_path(&self, resource: &str) -> PathBuf {
        self.context.config.storage.state_dir.join(format!("state_{resource}.json"))
    }

    pub fn read_state(&self, resource: &str) -> Value {
        let raw = std::fs::read(self.state_path(resource)).expect("state file");
        serde_json::from_slice(&raw).expect("state json")
    }

    pub fn channels_file(&self) -> PathBuf {
        self.context.config.storage.channels_file.clone()
    }

    /// Baseline listing (no sync token) answering with one page.
    pub async fn mount_baseline(&self, resource: &str, items: Vec<Value>, sync_token: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/calendars/{resource}/events")))
            .and(query_param_is_missing("syncToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(events_page(items, Some(sync_token))))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_incremental(&self, resource: &str, sync_token: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/calendars/{resource}/events")))
            .and(query_param("syncToken", sync_token))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_watch(&self, resource: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(format!("/calendars/{resource}/events/watch")))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// `init_watch` for `resource` with a one-event baseline at `sync-1`.
    pub async fn watch_one(&self, resource: &str) -> String {
        self.mount_baseline(resource, vec![event("a", "\"e1\"", "Standup")], "sync-1").await;
        self.mount_watch(resource, watch_response(&format!("res-{resource}"))).await;

        let (status, body) = self.post("/init_watch").await;
        assert_eq!(status, StatusCode::OK, "init_watch failed: {body}");
        body["started"][0]["subscription_id"].as_str().expect("subscription id").to_string()
    }
}

pub fn events_page(items: Vec<Value>, next_sync_token: Option<&str>) -> Value {
    let mut body = json!({ "kind": "calendar#events", "items": items });
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

pub fn watch_response(resource_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "kind": "api#channel",
        "resourceId": resource_id,
        "expiration": "1767225600000"
    }))
}
