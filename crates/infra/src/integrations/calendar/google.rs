//! Google Calendar change feed and push channel adapter

use std::time::Duration;

use async_trait::async_trait;
use calrelay_core::{ChangeFeedProvider, WatchProvider};
use calrelay_domain::{
    CalRelayError, ChangePage, Config, ResourceId, Result, Subscription, WatchRegistration,
    MAX_PAGE_SIZE,
};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::wire::{EventsResponse, StopRequest, WatchRequest, WatchResponse};
use crate::errors::{status_error, InfraError};
use crate::http::HttpClient;

type QueryParam = (&'static str, String);

/// Google Calendar v3 adapter for both the change feed and push channels.
pub struct GoogleCalendarFeed {
    http: HttpClient,
    api_base: Url,
    access_token: Option<String>,
    page_size: u32,
}

impl GoogleCalendarFeed {
    pub fn new(http: HttpClient, api_base: &str, access_token: Option<String>) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| CalRelayError::Config(format!("invalid calendar API base '{api_base}': {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(CalRelayError::Config(format!("calendar API base '{api_base}' cannot be a base URL")));
        }

        Ok(Self { http, api_base, access_token, page_size: MAX_PAGE_SIZE })
    }

    /// Build from relay configuration: provider timeout, three read attempts.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.provider.timeout())
            .read_attempts(3)
            .backoff(Duration::from_millis(250))
            .build()?;

        if config.provider.access_token.is_none() {
            warn!("no calendar access token configured; API calls will be unauthenticated");
        }

        Ok(Self::new(http, &config.provider.api_base, config.provider.access_token.clone())?
            .with_page_size(config.sync.effective_page_size()))
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| CalRelayError::Config("calendar API base cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn list_events(&self, resource: &ResourceId, params: &[QueryParam]) -> Result<Response> {
        let url = self.endpoint(&["calendars", resource.as_str(), "events"])?;
        let request = self.authorized(self.http.get(url)).query(params);
        self.http.fetch(request).await
    }

    fn page_params(&self, page_token: Option<&str>) -> Vec<QueryParam> {
        let mut params = vec![("showDeleted", "true".to_string()), ("maxResults", self.page_size.to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        params
    }
}

/// Decode a successful response body or map the status to a domain error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }

    response.json::<T>().await.map_err(|e| CalRelayError::from(InfraError::from(e)))
}

#[async_trait]
impl ChangeFeedProvider for GoogleCalendarFeed {
    #[instrument(skip_all, fields(resource = %resource))]
    async fn list_baseline(
        &self,
        resource: &ResourceId,
        since: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<ChangePage> {
        let mut params = self.page_params(page_token);
        params.extend([
            ("timeMin", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ]);

        let response = self.list_events(resource, &params).await?;
        let page: ChangePage = decode::<EventsResponse>(response).await?.into();
        debug!(items = page.items.len(), more = page.next_page_token.is_some(), "baseline page received");
        Ok(page)
    }

    #[instrument(skip_all, fields(resource = %resource))]
    async fn list_incremental(
        &self,
        resource: &ResourceId,
        cursor: &str,
        page_token: Option<&str>,
    ) -> Result<ChangePage> {
        let mut params = self.page_params(page_token);
        params.push(("syncToken", cursor.to_string()));

        let response = self.list_events(resource, &params).await?;
        if response.status() == StatusCode::GONE {
            let body = response.text().await.unwrap_or_default();
            return Err(CalRelayError::CursorExpired(format!("sync token rejected with 410 Gone: {}", body.trim())));
        }

        let page: ChangePage = decode::<EventsResponse>(response).await?.into();
        debug!(items = page.items.len(), more = page.next_page_token.is_some(), "change page received");
        Ok(page)
    }
}

#[async_trait]
impl WatchProvider for GoogleCalendarFeed {
    #[instrument(skip_all, fields(resource = %resource, subscription_id = %subscription_id))]
    async fn register_watch(
        &self,
        resource: &ResourceId,
        subscription_id: &str,
        callback_address: &str,
    ) -> Result<WatchRegistration> {
        let url = self.endpoint(&["calendars", resource.as_str(), "events", "watch"])?;
        let body = WatchRequest { id: subscription_id, kind: "web_hook", address: callback_address };
        let request = self.authorized(self.http.post(url)).json(&body);

        let response: WatchResponse = decode(self.http.submit(request).await?).await?;
        let expiry = response.expiration.as_ref().and_then(|e| e.to_datetime());

        info!(handle = %response.resource_id, ?expiry, "push channel registered");
        Ok(WatchRegistration { handle: response.resource_id, expiry })
    }

    #[instrument(skip_all, fields(subscription_id = %subscription.subscription_id))]
    async fn unregister(&self, subscription: &Subscription) -> Result<()> {
        let url = self.endpoint(&["channels", "stop"])?;
        let body = StopRequest { id: &subscription.subscription_id, resource_id: &subscription.handle };
        let request = self.authorized(self.http.post(url)).json(&body);

        let response = self.http.submit(request).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("channel already gone at provider");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        info!("push channel stopped");
        Ok(())
    }
}
