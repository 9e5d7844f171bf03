//! Share transport
//!
//! Issues JSON POST requests against the Share service. This module owns
//! the fixed request headers and the split between "the request failed" and
//! "the server answered with a failure". It never retries; that is the job
//! of [`ShareClient`](crate::ShareClient).

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Url};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ShareClientConfig;

/// Placeholder written over secrets in trace output
const REDACTED: &str = "***";

// =============================================================================
// Error Types
// =============================================================================

/// Failure below the HTTP layer: no response was received
///
/// # Examples
/// ```
/// use share_client::TransportError;
///
/// let error = TransportError::Connect("connection refused".to_string());
/// assert!(error.to_string().contains("refused"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other failure while sending or reading the response
    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// A POST request to a Share endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    /// Full request URL, including the query string
    pub url: String,
    /// JSON body, if the endpoint takes form fields
    pub body: Option<Vec<u8>>,
}

impl ShareRequest {
    /// Create a POST request without a body
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: None,
        }
    }

    /// Serialize `fields` as the JSON request body
    pub fn json_body<T: Serialize>(mut self, fields: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(fields)?);
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// An HTTP response from a Share endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Whether the status was 2xx
    pub success: bool,
    /// Response body
    pub body: String,
}

impl RawResponse {
    /// Create a response, deriving `success` from the status
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            success: (200..300).contains(&status),
            body: body.into(),
        }
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        self.success
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Sends requests to the Share service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `request`, returning the response or the reason none arrived
    async fn post(&self, request: ShareRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport
///
/// Every request carries `Accept: application/json` and the configured user
/// agent, and is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Create a transport from the client configuration
    pub fn new(config: &ShareClientConfig) -> Result<Self, TransportError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: ShareRequest) -> Result<RawResponse, TransportError> {
        let traced_url = redact_url(&request.url);
        debug!(
            url = %traced_url,
            payload = %redact_payload(request.body.as_deref()),
            "Sending Share request"
        );

        let mut req = self
            .client
            .post(&request.url)
            .header(ACCEPT, "application/json");

        if let Some(body) = request.body {
            req = req.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = req.send().await.map_err(|e| {
            debug!(url = %traced_url, error = %e, "Share request failed");
            TransportError::from(e)
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let raw = RawResponse::new(status, body);

        debug!(
            url = %traced_url,
            status,
            success = raw.success,
            body_len = raw.body.len(),
            "Received Share response"
        );
        trace!(url = %traced_url, body = %raw.body, "Share response body");

        Ok(raw)
    }
}

/// Mask the `sessionId` query value of a request URL
fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed.query_pairs().any(|(key, _)| key == "sessionId") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "sessionId" {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

/// Render a request body with its `password` field masked
fn redact_payload(body: Option<&[u8]>) -> String {
    let Some(body) = body else {
        return String::new();
    };
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(mut value) => {
            if let Some(password) = value.get_mut("password") {
                *password = serde_json::Value::String(REDACTED.to_string());
            }
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}
