//! Forwarding client for the third-party services the frontend reaches through this
//! backend (auth, notifications, mailer, LLM, CMS, billing).
//!
//! Every call is bounded by the configured timeout. Only `GET` and `HEAD` are retried,
//! and only after a timeout, a connection failure, or a 5xx answer.

pub mod router;

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;

pub use router::upstream_router;

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Request headers that describe the inbound hop and must not be forwarded.
const HOP_HEADERS: [HeaderName; 5] = [
    header::HOST,
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream service '{0}' is not configured")]
    UnknownService(String),
    #[error("upstream '{service}' did not answer within {after:?}")]
    Timeout { service: String, after: Duration },
    #[error("upstream '{service}' is unreachable: {reason}")]
    Unreachable { service: String, reason: String },
    #[error("upstream '{service}' request failed: {reason}")]
    Request { service: String, reason: String },
    #[error("invalid upstream path '{0}'")]
    InvalidPath(String),
    #[error("failed to build upstream client: {0}")]
    Client(String),
}

impl UpstreamError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::Timeout { .. } | UpstreamError::Unreachable { .. }
        )
    }
}

/// Inbound request to pass through unchanged.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Upstream answer relayed back to the caller.
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| UpstreamError::Client(err.to_string()))?;
        Ok(Self { http, config })
    }

    /// Names of the services with a configured base URL.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.config.services.keys().map(String::as_str)
    }

    pub fn target(
        &self,
        service: &str,
        path: &str,
        query: Option<&str>,
    ) -> Result<Url, UpstreamError> {
        let base = self
            .config
            .services
            .get(service)
            .ok_or_else(|| UpstreamError::UnknownService(service.to_string()))?;
        if path.split(['/', '\\']).any(is_dot_segment) {
            return Err(UpstreamError::InvalidPath(path.to_string()));
        }

        let mut raw = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        if let Some(query) = query.filter(|query| !query.is_empty()) {
            raw.push('?');
            raw.push_str(query);
        }
        let url = Url::parse(&raw).map_err(|_| UpstreamError::InvalidPath(path.to_string()))?;
        if !url.path().starts_with(base.path()) {
            return Err(UpstreamError::InvalidPath(path.to_string()));
        }
        Ok(url)
    }

    /// Forwards `request` to `service`, retrying idempotent reads.
    pub async fn forward(
        &self,
        service: &str,
        request: ForwardRequest,
    ) -> Result<ForwardedResponse, UpstreamError> {
        let url = self.target(service, &request.path, request.query.as_deref())?;
        let retries = if is_idempotent_read(&request.method) {
            self.config.read_retries
        } else {
            0
        };

        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 0;
        loop {
            let outcome = self.send_once(service, &url, &request).await;
            let retry = match &outcome {
                Ok(response) => response.status.is_server_error(),
                Err(err) => err.is_retryable(),
            };
            if !retry || attempt >= retries {
                return outcome;
            }

            attempt += 1;
            warn!(
                service,
                attempt,
                method = %request.method,
                "retrying upstream read"
            );
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }

    async fn send_once(
        &self,
        service: &str,
        url: &Url,
        request: &ForwardRequest,
    ) -> Result<ForwardedResponse, UpstreamError> {
        let mut headers = request.headers.clone();
        for name in HOP_HEADERS.iter() {
            headers.remove(name);
        }

        debug!(service, method = %request.method, url = %url, "forwarding upstream request");
        let response = self
            .http
            .request(request.method.clone(), url.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|err| self.classify(service, err))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|err| self.classify(service, err))?;

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }

    fn classify(&self, service: &str, err: reqwest::Error) -> UpstreamError {
        let service = service.to_string();
        if err.is_timeout() {
            UpstreamError::Timeout {
                service,
                after: self.config.timeout,
            }
        } else if err.is_connect() {
            UpstreamError::Unreachable {
                service,
                reason: err.to_string(),
            }
        } else {
            UpstreamError::Request {
                service,
                reason: err.to_string(),
            }
        }
    }
}

/// `.` and `..` segments, including percent-encoded ones, would let the joined URL
/// climb out of the service's base path.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn is_idempotent_read(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}
