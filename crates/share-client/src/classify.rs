//! Error classification for retry decisions
//!
//! Two levels: [`ApplicationError::classify`] decides whether a service error
//! means the session is dead, and [`ShareError::failure_class`] places every
//! error the retry loop can see into one of three buckets.

use crate::{ApplicationError, ShareError};

/// Application error codes that mean the session token is dead
pub const SESSION_INVALID_CODES: [&str; 2] = ["SessionIdNotFound", "SessionNotValid"];

/// HTTP statuses treated as temporary unavailability
///
/// Network failure statuses: 408, 425, 429, 500, 502, 503, 504, 522, 524
const UNAVAILABLE_STATUSES: [u16; 9] = [408, 425, 429, 500, 502, 503, 504, 522, 524];

/// Classification of an application error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Session token rejected; log in again
    SessionInvalid,
    /// Unclassified service error; retrying will not help
    Fatal,
}

/// What the retry loop does with a failed pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Try again with the same session
    Transient,
    /// Drop the session token, then try again
    SessionInvalid,
    /// Stop and report the error
    Fatal,
}

impl ApplicationError {
    /// Classify this error by its code
    ///
    /// # Examples
    /// ```
    /// use share_client::{ApplicationError, ErrorClass};
    ///
    /// let error = ApplicationError::new("SessionNotValid", "Session expired");
    /// assert_eq!(error.classify(), ErrorClass::SessionInvalid);
    /// ```
    pub fn classify(&self) -> ErrorClass {
        if SESSION_INVALID_CODES.contains(&self.code()) {
            ErrorClass::SessionInvalid
        } else {
            ErrorClass::Fatal
        }
    }
}

impl From<ErrorClass> for FailureClass {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::SessionInvalid => FailureClass::SessionInvalid,
            ErrorClass::Fatal => FailureClass::Fatal,
        }
    }
}

impl ShareError {
    /// Decide how the retry loop treats this error
    pub fn failure_class(&self) -> FailureClass {
        match self {
            ShareError::Transport(_) => FailureClass::Transient,
            ShareError::Application(err) => err.classify().into(),
            ShareError::Http { status, .. } if UNAVAILABLE_STATUSES.contains(status) => {
                FailureClass::Transient
            }
            ShareError::Http { .. }
            | ShareError::Malformed { .. }
            | ShareError::Cancelled
            | ShareError::InvalidInput(_) => FailureClass::Fatal,
        }
    }
}
