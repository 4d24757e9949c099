//! Shared HTTP session for the upstream API.
//!
//! One `reqwest::Client` (one connection pool) serves every call. A semaphore
//! caps concurrent in-flight requests; callers past the ceiling wait for a
//! permit instead of failing. Reads are retried on transient failures with
//! exponential backoff, writes are sent exactly once.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::metrics::{UPSTREAM_REQUESTS, UPSTREAM_REQUEST_DURATION, UPSTREAM_RETRIES};

use super::UpstreamError;

const API_KEY_HEADER: &str = "x-api-key";
const API_PREFIX: &str = "/api/v3";
const MAX_DETAIL_CHARS: usize = 200;

/// Backoff schedule for idempotent reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// A single upstream call, relative to the `/api/v3` prefix.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl UpstreamRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, UpstreamError> {
        let body = serde_json::to_value(body)
            .map_err(|e| UpstreamError::Client(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Only GET is treated as safe to repeat.
    pub fn is_idempotent(&self) -> bool {
        self.method == Method::GET
    }
}

/// Authenticated, pooled HTTP session against one upstream instance.
pub struct UpstreamSession {
    client: Client,
    api_base: String,
    /// Kept only to scrub it out of error text.
    api_key: String,
    timeout: Duration,
    permits: Semaphore,
    retry: RetryPolicy,
}

impl UpstreamSession {
    /// Create a new session from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            UpstreamError::Client("API key contains characters not valid in a header".to_string())
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .pool_max_idle_per_host(config.max_connections)
            .user_agent(concat!("reelgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_base: format!("{}{}", config.url.trim_end_matches('/'), API_PREFIX),
            api_key: config.api_key.clone(),
            timeout,
            permits: Semaphore::new(config.max_connections.max(1)),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Base URL every request path is joined to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send a request and decode the JSON body. Empty bodies decode as `null`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: UpstreamRequest,
    ) -> Result<T, UpstreamError> {
        let body = self.send_with_retry(&request).await?;
        decode(&body)
    }

    async fn send_with_retry(&self, request: &UpstreamRequest) -> Result<String, UpstreamError> {
        // Writes surface their first error as-is; reads always report an
        // exhausted budget, even a budget of one attempt.
        if !request.is_idempotent() {
            return self.send_once(request, 1).await;
        }
        let max_attempts = self.retry.max_attempts;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(request, attempt).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() => {
                    if attempt >= max_attempts {
                        return Err(UpstreamError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }

                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        method = %request.method,
                        path = %request.path,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Upstream read failed, retrying"
                    );
                    UPSTREAM_RETRIES.inc();
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(
        &self,
        request: &UpstreamRequest,
        attempt: u32,
    ) -> Result<String, UpstreamError> {
        // Held for the whole exchange, released before any backoff sleep.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| UpstreamError::Client("Upstream session is closed".to_string()))?;

        let url = format!(
            "{}/{}",
            self.api_base,
            request.path.trim_start_matches('/')
        );
        debug!(method = %request.method, path = %request.path, attempt, "Upstream request");

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let result = self.exchange(builder, &request.path).await;

        let method = request.method.as_str();
        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.label(),
        };
        UPSTREAM_REQUESTS.with_label_values(&[method, outcome]).inc();
        UPSTREAM_REQUEST_DURATION
            .with_label_values(&[method])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn exchange(&self, builder: RequestBuilder, path: &str) -> Result<String, UpstreamError> {
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return Ok(body);
        }

        debug!(path = path, status = status.as_u16(), "Upstream returned an error status");
        Err(self.status_error(status, path, &body))
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else if err.is_connect() || err.is_request() || err.is_body() {
            UpstreamError::Connection(self.scrub(&err.to_string()))
        } else {
            UpstreamError::Client(self.scrub(&err.to_string()))
        }
    }

    fn status_error(&self, status: StatusCode, path: &str, body: &str) -> UpstreamError {
        let detail = self.scrub(&summarize_body(body));
        match status.as_u16() {
            401 | 403 => UpstreamError::Authentication {
                status: status.as_u16(),
            },
            404 => UpstreamError::NotFound(if detail.is_empty() {
                path.to_string()
            } else {
                format!("{} ({})", path, detail)
            }),
            409 => UpstreamError::Conflict(detail),
            400 | 422 if is_duplicate_movie(body) => UpstreamError::Conflict(detail),
            400 | 422 => UpstreamError::Rejected(detail),
            code if status.is_server_error() => UpstreamError::Unavailable {
                status: code,
                message: detail,
            },
            code => UpstreamError::Client(format!("Unexpected HTTP {}: {}", code, detail)),
        }
    }

    fn scrub(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.api_key, "****")
        }
    }
}

impl fmt::Debug for UpstreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamSession")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, UpstreamError> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| UpstreamError::ParseError(e.to_string()))
}

/// Radarr reports errors either as `{"message": ...}` or as a list of
/// validation failures with `errorMessage` fields.
fn summarize_body(body: &str) -> String {
    let summary = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Ok(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("errorMessage").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                body.to_string()
            } else {
                messages.join("; ")
            }
        }
        _ => body.trim().to_string(),
    };

    summary.chars().take(MAX_DETAIL_CHARS).collect()
}

fn is_duplicate_movie(body: &str) -> bool {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    items.iter().any(|item| {
        item.get("errorCode").and_then(Value::as_str) == Some("MovieExistsValidator")
    })
}
