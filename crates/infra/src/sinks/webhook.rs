//! HTTP webhook diff sink

use async_trait::async_trait;
use calrelay_core::DiffSink;
use calrelay_domain::{CalRelayError, DiffEvent, ResourceId, Result, SinkConfig};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::errors::status_error;
use crate::http::HttpClient;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Serialize)]
struct WebhookPayload<'a> {
    calendar_id: &'a ResourceId,
    #[serde(flatten)]
    event: &'a DiffEvent,
}

/// Posts each diff as JSON to a configured URL.
///
/// One attempt per diff, bounded by the sink timeout. The optional API key is
/// sent as `x-api-key`.
pub struct WebhookDiffSink {
    http: HttpClient,
    url: Url,
}

impl WebhookDiffSink {
    pub fn new(http: HttpClient, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| CalRelayError::Config(format!("invalid sink URL: {e}")))?;
        Ok(Self { http, url })
    }

    /// `None` when no sink URL is configured.
    pub fn from_config(config: &SinkConfig) -> Result<Option<Self>> {
        let Some(url) = config.url.as_deref() else {
            return Ok(None);
        };

        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref() {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| CalRelayError::Config("sink API key is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let http = HttpClient::builder().timeout(config.timeout()).default_headers(headers).build()?;

        Self::new(http, url).map(Some)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl DiffSink for WebhookDiffSink {
    #[instrument(skip_all, fields(item_id = %event.item_id, kind = %event.kind))]
    async fn deliver(&self, event: &DiffEvent) -> Result<()> {
        let payload = WebhookPayload { calendar_id: &event.resource_id, event };
        let request = self.http.post(self.url.clone()).json(&payload);

        let response = self.http.submit(request).await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let preview: String = body.chars().take(100).collect();
        debug!(%status, body = %preview, "diff delivered");
        Ok(())
    }
}
