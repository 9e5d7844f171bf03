//! Test utilities and fixtures for Share client testing
//!
//! Response bodies in the shape the Share service produces, ready-made raw
//! responses, request matchers for mock transports, and tracing setup.

#![allow(dead_code)] // Test utilities may not all be used yet

use crate::client::LATEST_GLUCOSE_PATH;
use crate::session::LOGIN_PATH;
use crate::transport::ShareRequest;

/// Install a test-writer tracing subscriber (honours `RUST_LOG`)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Matches requests to the login endpoint
pub fn is_login(request: &ShareRequest) -> bool {
    request.url.ends_with(LOGIN_PATH)
}

/// Matches requests to the latest-values endpoint
pub fn is_fetch(request: &ShareRequest) -> bool {
    request.url.contains(LATEST_GLUCOSE_PATH)
}

/// Response bodies
pub mod bodies {
    /// Login success body
    pub fn token(token: &str) -> String {
        serde_json::Value::String(token.to_string()).to_string()
    }

    /// Share error object
    pub fn error(code: &str, message: &str) -> String {
        serde_json::json!({ "Code": code, "Message": message }).to_string()
    }

    /// One reading: 120 mg/dL, Flat, at 1700000000
    pub fn single_reading() -> String {
        readings(&[(1_700_000_000, 120.0, "Flat")])
    }

    /// Readings from `(unix seconds, value, trend)` triples
    pub fn readings(entries: &[(i64, f64, &str)]) -> String {
        let list: Vec<serde_json::Value> = entries
            .iter()
            .map(|(secs, value, trend)| {
                let millis = secs * 1000;
                serde_json::json!({
                    "DT": format!("/Date({millis}-0500)/"),
                    "ST": format!("/Date({millis})/"),
                    "WT": format!("/Date({millis})/"),
                    "Value": value,
                    "Trend": trend,
                })
            })
            .collect();
        serde_json::Value::Array(list).to_string()
    }
}

/// Raw responses
pub mod responses {
    use super::bodies;
    use crate::transport::RawResponse;

    /// Successful login
    pub fn token(token: &str) -> RawResponse {
        RawResponse::new(200, bodies::token(token))
    }

    /// Successful fetch of one reading
    pub fn single_reading() -> RawResponse {
        RawResponse::new(200, bodies::single_reading())
    }

    /// Dead session reported with a 500, as the service does
    pub fn session_id_not_found() -> RawResponse {
        RawResponse::new(
            500,
            bodies::error("SessionIdNotFound", "Session ID not found"),
        )
    }

    /// Dead session reported with a success status
    pub fn session_not_valid_ok() -> RawResponse {
        RawResponse::new(200, bodies::error("SessionNotValid", "Session not active or timed out"))
    }

    /// Wrong password
    pub fn account_password_invalid() -> RawResponse {
        RawResponse::new(
            500,
            bodies::error("AccountPasswordInvalid", "Publisher account password failed"),
        )
    }
}
