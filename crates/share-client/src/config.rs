//! Client configuration
//!
//! The server, transport and retry settings are fixed when a [`ShareClient`]
//! is constructed and do not change for its lifetime.
//!
//! [`ShareClient`]: crate::ShareClient

use std::time::Duration;

/// Share server for US accounts
pub const SERVER_US: &str = "https://share1.dexcom.com";

/// Share server for accounts outside the US
pub const SERVER_NON_US: &str = "https://shareous1.dexcom.com";

/// Application id the Share mobile client identifies itself with
pub const DEFAULT_APPLICATION_ID: &str = "d89443d2-327c-4a6f-89e5-496bbb0317db";

/// User agent of the Share mobile client
pub const DEFAULT_USER_AGENT: &str = "Dexcom Share/3.0.2.11 CFNetwork/711.2.23 Darwin/14.0.0";

/// Number of passes `fetch_latest` makes before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Lookback window sent with every fetch (one day)
pub const DEFAULT_LOOKBACK_MINUTES: u32 = 1440;

/// Deployment region of a Share account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    /// Accounts registered in the US
    #[default]
    Us,
    /// Accounts registered anywhere else
    NonUs,
}

impl Region {
    /// Base URL of the region's Share server
    pub fn server_url(&self) -> &'static str {
        match self {
            Region::Us => SERVER_US,
            Region::NonUs => SERVER_NON_US,
        }
    }
}

/// Configuration for [`ShareClient`](crate::ShareClient)
#[derive(Debug, Clone)]
pub struct ShareClientConfig {
    /// Base server URL (e.g., "https://share1.dexcom.com")
    pub server_url: String,
    /// User agent string
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Default retry budget for `fetch_latest`
    pub max_attempts: u32,
    /// Pause between two passes of the retry loop
    pub retry_delay: Duration,
    /// `minutes` query value of the fetch request
    pub lookback_minutes: u32,
}

impl Default for ShareClientConfig {
    fn default() -> Self {
        Self {
            server_url: SERVER_US.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::ZERO,
            lookback_minutes: DEFAULT_LOOKBACK_MINUTES,
        }
    }
}

impl ShareClientConfig {
    /// Create a new config with an explicit server URL
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Create a new config for one of the two Share regions
    pub fn for_region(region: Region) -> Self {
        Self::new(region.server_url())
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default retry budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the pause between passes
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the fetch lookback window
    pub fn with_lookback_minutes(mut self, minutes: u32) -> Self {
        self.lookback_minutes = minutes;
        self
    }
}
