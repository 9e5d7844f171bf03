//! ShareClient - polling client for Dexcom Share
//!
//! The client logs in on demand, fetches the latest readings, and retries
//! within a bounded budget. Each pass of the retry loop performs at most one
//! login-or-reuse followed by at most one fetch, and its failure is bucketed
//! by [`ShareError::failure_class`]:
//!
//! | Outcome                    | Effect                                    |
//! |----------------------------|-------------------------------------------|
//! | readings decoded           | return `Ok(Some(readings))`               |
//! | no token / transient error | next pass                                 |
//! | session invalid            | drop the token, next pass logs in again   |
//! | fatal error                | return `Err` immediately                  |
//! | budget spent               | return `Ok(None)`                         |
//!
//! # Example
//!
//! ```rust,no_run
//! use share_client::{Region, ShareClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = ShareClient::for_region("alice", "password", Region::Us)?;
//!
//!     match client.fetch_latest(3).await? {
//!         Some(readings) => println!("Latest: {} mg/dL", readings[0].value),
//!         None => println!("Share temporarily unavailable"),
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classify::FailureClass;
use crate::config::{Region, ShareClientConfig};
use crate::decode::decode_readings;
use crate::session::{SessionManager, SessionToken};
use crate::transport::{HttpTransport, ShareRequest, Transport};
use crate::types::{Credentials, Reading};
use crate::{Result, ShareError};

/// Path of the latest-values endpoint
pub const LATEST_GLUCOSE_PATH: &str =
    "/ShareWebServices/Services/Publisher/ReadPublisherLatestGlucoseValues";

/// Polling client for one Share account
///
/// Every entry point takes `&mut self`, so one instance serves one poll at a
/// time. Poll several accounts with one client each.
pub struct ShareClient {
    /// Transport used for fetches (shared with the session manager)
    transport: Arc<dyn Transport>,
    /// Session state and login exchange
    session: SessionManager,
    /// Latest-values URL without query
    fetch_url: Url,
    /// Configuration
    config: ShareClientConfig,
}

impl ShareClient {
    /// Create a client that talks HTTP to `config.server_url`
    pub fn new(credentials: Credentials, config: ShareClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(credentials, config, Arc::new(transport))
    }

    /// Create a client for a region's Share server with default settings
    ///
    /// # Example
    ///
    /// ```rust
    /// use share_client::{Region, ShareClient};
    ///
    /// let client = ShareClient::for_region("alice", "password", Region::NonUs).unwrap();
    /// assert_eq!(client.server_url(), "https://shareous1.dexcom.com");
    /// ```
    pub fn for_region(
        username: impl Into<String>,
        password: impl Into<String>,
        region: Region,
    ) -> Result<Self> {
        Self::new(
            Credentials::new(username, password),
            ShareClientConfig::for_region(region),
        )
    }

    /// Create a client over a custom transport
    pub fn with_transport(
        credentials: Credentials,
        config: ShareClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let server_url = config.server_url.trim_end_matches('/');
        let fetch_url = Url::parse(&format!("{}{}", server_url, LATEST_GLUCOSE_PATH))
            .map_err(|e| {
                ShareError::InvalidInput(format!("Invalid server URL {}: {}", server_url, e))
            })?;
        let session = SessionManager::new(transport.clone(), credentials, server_url);

        Ok(Self {
            transport,
            session,
            fetch_url,
            config,
        })
    }

    /// Fetch up to `count` latest readings, newest first
    ///
    /// Uses the configured retry budget. `Ok(None)` means the budget ran out
    /// without data or a fatal error: Share is temporarily unavailable.
    pub async fn fetch_latest(&mut self, count: u32) -> Result<Option<Vec<Reading>>> {
        let budget = self.config.max_attempts;
        self.run(count, budget, &CancellationToken::new()).await
    }

    /// Like [`fetch_latest`](Self::fetch_latest) with an explicit retry budget
    pub async fn fetch_latest_with_budget(
        &mut self,
        count: u32,
        budget: u32,
    ) -> Result<Option<Vec<Reading>>> {
        self.run(count, budget, &CancellationToken::new()).await
    }

    /// Like [`fetch_latest`](Self::fetch_latest), aborting with
    /// [`ShareError::Cancelled`] as soon as `cancel` fires
    pub async fn fetch_latest_cancellable(
        &mut self,
        count: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<Reading>>> {
        let budget = self.config.max_attempts;
        self.run(count, budget, cancel).await
    }

    /// Check if a session token is currently held
    pub fn has_session(&self) -> bool {
        self.session.has_token()
    }

    /// Number of login exchanges performed so far
    pub fn login_attempts(&self) -> u64 {
        self.session.login_attempts()
    }

    /// Get the account name
    pub fn username(&self) -> &str {
        self.session.credentials().username()
    }

    /// Get the client configuration
    pub fn config(&self) -> &ShareClientConfig {
        &self.config
    }

    /// Get the server URL
    pub fn server_url(&self) -> &str {
        &self.config.server_url
    }

    /// The retry loop
    ///
    /// `attempt` counts passes for tracing; `remaining` is the budget and the
    /// only termination condition.
    async fn run(
        &mut self,
        count: u32,
        budget: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<Reading>>> {
        if count == 0 {
            return Err(ShareError::InvalidInput(
                "count must be at least 1".to_string(),
            ));
        }

        let mut attempt: u32 = 0;
        let mut remaining = budget;

        while remaining > 0 {
            attempt += 1;
            remaining -= 1;
            debug!(attempt, remaining, count, "Fetching glucose");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ShareError::Cancelled),
                outcome = self.poll_once(count) => outcome,
            };

            match outcome {
                Ok(Some(readings)) => {
                    info!(attempt, readings = readings.len(), "Fetched glucose readings");
                    return Ok(Some(readings));
                }
                Ok(None) => {
                    warn!(attempt, remaining, "No token or readings this pass, retrying");
                }
                Err(err) => match err.failure_class() {
                    FailureClass::Transient => {
                        warn!(attempt, remaining, error = %err, "Transient failure, retrying");
                    }
                    FailureClass::SessionInvalid => {
                        warn!(
                            attempt,
                            remaining,
                            error = %err,
                            "Session rejected, must log in again"
                        );
                        self.session.invalidate();
                    }
                    FailureClass::Fatal => {
                        warn!(attempt, error = %err, "Fatal failure, giving up");
                        return Err(err);
                    }
                },
            }

            if remaining > 0 && !self.config.retry_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ShareError::Cancelled),
                    _ = tokio::time::sleep(self.config.retry_delay) => {}
                }
            }
        }

        warn!(attempts = attempt, "Retry budget exhausted without readings");
        Ok(None)
    }

    /// One pass: ensure a token, then fetch with it
    ///
    /// `Ok(None)` means no token could be obtained or the fetch returned no
    /// reading list.
    async fn poll_once(&mut self, count: u32) -> Result<Option<Vec<Reading>>> {
        let Some(token) = self.session.ensure_token().await? else {
            return Ok(None);
        };

        let request = ShareRequest::post(self.fetch_request_url(&token, count));
        let response = self.transport.post(request).await?;
        let readings = decode_readings(&response, count as usize)?;
        if readings.is_none() {
            debug!(status = response.status, "Fetch returned no reading list");
        }
        Ok(readings)
    }

    fn fetch_request_url(&self, token: &SessionToken, count: u32) -> String {
        let mut url = self.fetch_url.clone();
        url.query_pairs_mut()
            .append_pair("sessionId", token.expose())
            .append_pair("minutes", &self.config.lookback_minutes.to_string())
            .append_pair("maxCount", &count.to_string());
        url.to_string()
    }
}

impl std::fmt::Debug for ShareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareClient")
            .field("session", &self.session)
            .field("config", &self.config)
            .finish()
    }
}
