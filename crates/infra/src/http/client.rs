use std::time::Duration;

use calrelay_domain::{CalRelayError, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, IntoUrl, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("calrelay/", env!("CARGO_PKG_VERSION"));

/// Longest `Retry-After` the client will wait out before giving up.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Outbound HTTP shared by the calendar adapter and the webhook sink.
///
/// Reads go through [`HttpClient::fetch`] and are retried on throttling,
/// 5xx responses and connection failures. Anything with side effects at the
/// far end (channel registration, channel stop, diff delivery) goes through
/// [`HttpClient::submit`], which sends exactly once.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    read_attempts: usize,
    backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        self.client.request(Method::GET, url)
    }

    pub fn post(&self, url: impl IntoUrl) -> RequestBuilder {
        self.client.request(Method::POST, url)
    }

    /// Send an idempotent read, retrying transient failures.
    ///
    /// 4xx responses other than 429 come back to the caller untouched, so a
    /// 410 on an expired sync token is seen on the first attempt.
    pub async fn fetch(&self, builder: RequestBuilder) -> Result<Response> {
        let attempts = self.read_attempts;

        for attempt in 1..=attempts {
            let request = builder
                .try_clone()
                .ok_or_else(|| CalRelayError::Internal("read request body is not replayable".into()))?
                .build()
                .map_err(into_domain)?;
            let url = request.url().clone();
            let last = attempt == attempts;

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    if last || !is_transient(status) {
                        debug!(attempt, %url, %status, "read completed");
                        return Ok(response);
                    }

                    let delay = retry_after(response.headers()).unwrap_or_else(|| self.backoff_for(attempt));
                    if delay > MAX_RETRY_AFTER {
                        warn!(%url, %status, ?delay, "server asked for a longer pause than allowed");
                        return Ok(response);
                    }
                    debug!(attempt, %url, %status, ?delay, "transient status; retrying read");
                    tokio::time::sleep(delay).await;
                }
                Err(err) if !last && (err.is_connect() || err.is_timeout()) => {
                    let delay = self.backoff_for(attempt);
                    debug!(attempt, %url, error = %err, ?delay, "read failed; retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(into_domain(err)),
            }
        }

        Err(CalRelayError::Internal("read loop ended without a response".into()))
    }

    /// Send a request with side effects exactly once.
    pub async fn submit(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(into_domain)?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.client.execute(request).await.map_err(into_domain)?;
        debug!(%method, %url, status = %response.status(), "request completed");
        Ok(response)
    }

    /// Delay before the retry that follows `attempt`; doubles up to 8x.
    fn backoff_for(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(3) as u32;
        self.backoff.saturating_mul(1 << shift)
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `Retry-After` in its delta-seconds form; HTTP dates fall back to backoff.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds))
}

fn into_domain(err: reqwest::Error) -> CalRelayError {
    InfraError::from(err).into()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    read_attempts: usize,
    backoff: Duration,
    headers: HeaderMap,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            read_attempts: 3,
            backoff: Duration::from_millis(250),
            headers: HeaderMap::new(),
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout, connect through body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total tries for a [`HttpClient::fetch`], including the first.
    pub fn read_attempts(mut self, attempts: usize) -> Self {
        self.read_attempts = attempts.max(1);
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Headers sent with every request.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(self.headers)
            .no_proxy()
            .build()
            .map_err(into_domain)?;

        Ok(HttpClient { client, read_attempts: self.read_attempts, backoff: self.backoff })
    }
}
