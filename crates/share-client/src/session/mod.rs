//! Share session management
//!
//! A Share session is a single opaque token obtained by logging in with the
//! account credentials. It stays valid until the server rejects it; it is
//! never persisted and never handed out across the crate's public API.
//!
//! # Lifecycle
//!
//! - No token held: the next [`SessionManager::ensure_token`] logs in.
//! - Token held: it is reused for every fetch.
//! - The server reports the token dead: the caller invokes
//!   [`SessionManager::invalidate`] and the next `ensure_token` logs in again.

mod manager;

pub use manager::{SessionManager, LOGIN_PATH};

/// Opaque Share session token
///
/// `Debug` never shows the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub(crate) fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building fetch requests
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}
