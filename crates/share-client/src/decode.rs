//! Response decoding
//!
//! Turns a [`RawResponse`] into the value an endpoint promises, or into the
//! [`ShareError`] that explains why it could not. A body that is a Share error
//! object (`{"Code": ..., "Message": ...}`) becomes
//! [`ShareError::Application`] whatever the HTTP status was, so the retry loop
//! can classify it. Anything else that does not fit is either
//! [`ShareError::Malformed`] (success status) or [`ShareError::Http`].

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::transport::RawResponse;
use crate::types::Reading;
use crate::{ApplicationError, Endpoint, Result, ShareError};

/// Share error object as it appears on the wire
#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(rename = "Code", alias = "code")]
    code: String,
    #[serde(rename = "Message", alias = "message", default)]
    message: String,
}

/// Decode a login response into a session token
///
/// An empty token, a `null` body or a blank body is reported as `None`.
pub fn decode_token(response: &RawResponse) -> Result<Option<String>> {
    let token: Option<String> = decode(Endpoint::Login, response)?;
    Ok(token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty()))
}

/// Decode a latest-values response into at most `count` readings, newest first
///
/// A `null` or blank body is reported as `None`; an empty list is `Some`.
pub fn decode_readings(response: &RawResponse, count: usize) -> Result<Option<Vec<Reading>>> {
    let Some(mut readings) = decode::<Vec<Reading>>(Endpoint::LatestGlucose, response)? else {
        return Ok(None);
    };
    readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    readings.truncate(count);
    Ok(Some(readings))
}

/// Decode the structured error object carried by `body`, if there is one
pub fn decode_application_error(body: &str) -> Option<ApplicationError> {
    serde_json::from_str::<WireError>(body)
        .ok()
        .map(|wire| ApplicationError::new(wire.code, wire.message))
}

/// Decode a nullable payload; a blank success body decodes as `None`
fn decode<T: DeserializeOwned>(endpoint: Endpoint, response: &RawResponse) -> Result<Option<T>> {
    if response.success {
        if response.body.trim().is_empty() {
            return Ok(None);
        }
        return serde_json::from_str(&response.body).map_err(|e| {
            match decode_application_error(&response.body) {
                Some(app) => ShareError::Application(app),
                None => ShareError::Malformed {
                    endpoint,
                    reason: e.to_string(),
                },
            }
        });
    }

    Err(match decode_application_error(&response.body) {
        Some(app) => ShareError::Application(app),
        None => ShareError::Http {
            status: response.status,
            body: response.body.clone(),
        },
    })
}
