//! Dexcom Share Client Library
//!
//! This crate implements a session-authenticated polling client for the Dexcom
//! Share service: it logs in to obtain a session token, fetches the latest
//! glucose readings with it, and recovers from network failures and expired
//! sessions within a bounded retry budget.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod client;
pub mod config;
pub mod decode;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use classify::{ErrorClass, FailureClass};
pub use client::ShareClient;
pub use config::{Region, ShareClientConfig};
pub use tokio_util::sync::CancellationToken;
pub use transport::{HttpTransport, RawResponse, ShareRequest, Transport, TransportError};
pub use types::{delta, Credentials, GlucoseUnit, Reading, Trend};

/// Result type for Share operations
pub type Result<T> = std::result::Result<T, ShareError>;

/// Which Share endpoint a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `LoginPublisherAccountByName`
    Login,
    /// `ReadPublisherLatestGlucoseValues`
    LatestGlucose,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Login => write!(f, "login"),
            Endpoint::LatestGlucose => write!(f, "latest glucose"),
        }
    }
}

/// Structured error payload reported by the Share service
///
/// The service answers a logical failure with `{"Code": ..., "Message": ...}`
/// instead of the expected data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationError {
    code: String,
    message: String,
}

impl ApplicationError {
    /// Create a new application error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Get the error code (e.g., "SessionNotValid")
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApplicationError {}

/// Error types for Share operations
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// The request never produced an HTTP response
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service reported a structured failure
    #[error("Share service error {0}")]
    Application(#[from] ApplicationError),

    /// A success response whose body could not be decoded
    #[error("Malformed {endpoint} response: {reason}")]
    Malformed {
        /// Endpoint that produced the body
        endpoint: Endpoint,
        /// Decoder failure
        reason: String,
    },

    /// A non-success HTTP status without a structured error body
    #[error("HTTP error ({status}): {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The poll was cancelled by the caller
    #[error("Poll cancelled")]
    Cancelled,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ShareError {
    /// Check if this error means the held session token is dead
    pub fn is_session_invalid(&self) -> bool {
        self.failure_class() == FailureClass::SessionInvalid
    }

    /// Check if this error is worth another attempt with the same session
    pub fn is_transient(&self) -> bool {
        self.failure_class() == FailureClass::Transient
    }

    /// Get the application error carried by this error, if any
    pub fn application_error(&self) -> Option<&ApplicationError> {
        match self {
            ShareError::Application(err) => Some(err),
            _ => None,
        }
    }
}
