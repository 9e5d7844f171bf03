//! Session manager
//!
//! Owns the credentials and the currently held session token, and performs
//! the login exchange when a token is needed and none is held.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::decode::decode_token;
use crate::session::SessionToken;
use crate::transport::{ShareRequest, Transport};
use crate::types::Credentials;
use crate::{Result, ShareError};

/// Path of the login endpoint
pub const LOGIN_PATH: &str = "/ShareWebServices/Services/General/LoginPublisherAccountByName";

/// Holds at most one session token for one account
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use share_client::session::SessionManager;
/// use share_client::{Credentials, HttpTransport, ShareClientConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ShareClientConfig::default();
///     let transport = Arc::new(HttpTransport::new(&config)?);
///     let mut manager = SessionManager::new(
///         transport,
///         Credentials::new("alice", "password"),
///         &config.server_url,
///     );
///
///     if manager.ensure_token().await?.is_some() {
///         println!("Logged in");
///     }
///     Ok(())
/// }
/// ```
pub struct SessionManager {
    /// Transport used for the login exchange
    transport: Arc<dyn Transport>,

    /// Account credentials
    credentials: Credentials,

    /// Full login URL
    login_url: String,

    /// Currently held token
    token: Option<SessionToken>,

    /// Login exchanges performed over the manager's lifetime
    login_attempts: u64,
}

impl SessionManager {
    /// Create a session manager that logs in against `server_url`
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        server_url: &str,
    ) -> Self {
        Self {
            transport,
            credentials,
            login_url: format!("{}{}", server_url.trim_end_matches('/'), LOGIN_PATH),
            token: None,
            login_attempts: 0,
        }
    }

    /// Return the held token, logging in first if none is held
    ///
    /// `Ok(None)` means no token could be obtained this time (the login
    /// request failed in transit, the server was temporarily unavailable, or
    /// it returned an empty token). A structured login error is returned as
    /// [`ShareError::Application`] for the caller to classify.
    pub async fn ensure_token(&mut self) -> Result<Option<SessionToken>> {
        if let Some(token) = &self.token {
            return Ok(Some(token.clone()));
        }

        debug!(account = self.credentials.username(), "Fetching session token");

        let request = ShareRequest::post(&self.login_url)
            .json_body(&self.credentials.login_request())
            .map_err(|e| ShareError::InvalidInput(format!("Failed to encode login: {}", e)))?;

        self.login_attempts += 1;
        let response = match self.transport.post(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Login request failed");
                return Ok(None);
            }
        };

        let token = match decode_token(&response) {
            Ok(token) => token,
            Err(err) if err.is_transient() => {
                warn!(error = %err, "Login temporarily unavailable");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        match token {
            Some(token) => {
                info!(account = self.credentials.username(), "Logged in to Share");
                let token = SessionToken::new(token);
                self.token = Some(token.clone());
                Ok(Some(token))
            }
            None => {
                warn!("Login returned an empty session token");
                Ok(None)
            }
        }
    }

    /// Drop the held token so the next `ensure_token` logs in again
    pub fn invalidate(&mut self) {
        if self.token.take().is_some() {
            debug!("Session token invalidated");
        }
    }

    /// Check if a token is currently held
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Number of login exchanges performed so far
    pub fn login_attempts(&self) -> u64 {
        self.login_attempts
    }

    /// Get the account credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("login_url", &self.login_url)
            .field("has_token", &self.token.is_some())
            .field("login_attempts", &self.login_attempts)
            .finish()
    }
}
