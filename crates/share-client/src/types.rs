//! Share data types
//!
//! Credentials sent with the login exchange and the glucose readings returned
//! by the latest-values endpoint.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::DEFAULT_APPLICATION_ID;

/// mg/dL per mmol/L
pub const MMOL_FACTOR: f64 = 18.01559;

// =============================================================================
// Credentials
// =============================================================================

/// Account credentials for the login exchange
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    application_id: String,
}

impl Credentials {
    /// Create credentials using the Share mobile application id
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            application_id: DEFAULT_APPLICATION_ID.to_string(),
        }
    }

    /// Replace the application id
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = application_id.into();
        self
    }

    /// Get the account name
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the application id
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Build the login request body
    pub(crate) fn login_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            account_name: &self.username,
            password: &self.password,
            application_id: &self.application_id,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("application_id", &self.application_id)
            .finish()
    }
}

/// Login request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub account_name: &'a str,
    pub password: &'a str,
    pub application_id: &'a str,
}

// =============================================================================
// Trend
// =============================================================================

/// Direction the glucose value is moving in
///
/// The service reports either the numeric code (declaration order, 0-9) or
/// the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Trend {
    /// No trend reported
    None,
    /// Rising quickly
    DoubleUp,
    /// Rising
    SingleUp,
    /// Rising slowly
    FortyFiveUp,
    /// Steady
    Flat,
    /// Falling slowly
    FortyFiveDown,
    /// Falling
    SingleDown,
    /// Falling quickly
    DoubleDown,
    /// Sensor could not compute a trend
    NotComputable,
    /// Rate of change out of range
    RateOutOfRange,
    /// Code or name this client does not know
    #[default]
    Unknown,
}

impl Trend {
    const ALL: [Trend; 10] = [
        Trend::None,
        Trend::DoubleUp,
        Trend::SingleUp,
        Trend::FortyFiveUp,
        Trend::Flat,
        Trend::FortyFiveDown,
        Trend::SingleDown,
        Trend::DoubleDown,
        Trend::NotComputable,
        Trend::RateOutOfRange,
    ];

    /// Map a numeric wire code to a trend
    pub fn from_code(code: i64) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .unwrap_or(Trend::Unknown)
    }

    /// Map a wire name to a trend (numeric strings are accepted as codes)
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if let Ok(code) = name.parse::<i64>() {
            return Self::from_code(code);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|trend| trend.name().eq_ignore_ascii_case(name))
            .unwrap_or(Trend::Unknown)
    }

    /// Wire name of the trend
    pub fn name(&self) -> &'static str {
        match self {
            Trend::None => "None",
            Trend::DoubleUp => "DoubleUp",
            Trend::SingleUp => "SingleUp",
            Trend::FortyFiveUp => "FortyFiveUp",
            Trend::Flat => "Flat",
            Trend::FortyFiveDown => "FortyFiveDown",
            Trend::SingleDown => "SingleDown",
            Trend::DoubleDown => "DoubleDown",
            Trend::NotComputable => "NotComputable",
            Trend::RateOutOfRange => "RateOutOfRange",
            Trend::Unknown => "Unknown",
        }
    }

    /// Arrow used when displaying the trend
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::DoubleUp => "⇈",
            Trend::SingleUp => "↑",
            Trend::FortyFiveUp => "↗",
            Trend::Flat => "→",
            Trend::FortyFiveDown => "↘",
            Trend::SingleDown => "↓",
            Trend::DoubleDown => "⇊",
            Trend::None | Trend::NotComputable | Trend::RateOutOfRange | Trend::Unknown => "",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Trend {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(i64),
            Name(String),
            Other(serde::de::IgnoredAny),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Trend::from_code(code),
            Repr::Name(name) => Trend::from_name(&name),
            Repr::Other(_) => Trend::Unknown,
        })
    }
}

// =============================================================================
// Readings
// =============================================================================

/// Unit a glucose value is displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlucoseUnit {
    /// Milligrams per decilitre, as reported by the service
    #[default]
    MgDl,
    /// Millimoles per litre
    Mmol,
}

/// A single glucose reading
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireReading")]
pub struct Reading {
    /// Server-relative time of the reading
    pub timestamp: DateTime<Utc>,
    /// Glucose value in mg/dL
    pub value: f64,
    /// Trend direction
    pub trend: Trend,
    /// Device-relative display time, with the device's UTC offset
    pub device_time: Option<DateTime<FixedOffset>>,
}

impl Reading {
    /// Glucose value converted to `unit`
    pub fn value_in(&self, unit: GlucoseUnit) -> f64 {
        match unit {
            GlucoseUnit::MgDl => self.value,
            GlucoseUnit::Mmol => self.value / MMOL_FACTOR,
        }
    }
}

/// Difference between the newest and the previous reading
///
/// `readings` must be ordered most-recent-first, as returned by the client.
pub fn delta(readings: &[Reading]) -> Option<f64> {
    match readings {
        [latest, previous, ..] => Some(latest.value - previous.value),
        _ => None,
    }
}

/// Reading as it appears on the wire
#[derive(Debug, Deserialize)]
struct WireReading {
    #[serde(rename = "WT", alias = "wt")]
    wall_time: Option<String>,
    #[serde(rename = "ST", alias = "st")]
    system_time: Option<String>,
    #[serde(rename = "DT", alias = "dt")]
    display_time: Option<String>,
    #[serde(rename = "Value", alias = "value")]
    value: f64,
    #[serde(rename = "Trend", alias = "trend", default)]
    trend: Trend,
}

impl TryFrom<WireReading> for Reading {
    type Error = String;

    fn try_from(wire: WireReading) -> std::result::Result<Self, Self::Error> {
        let raw = wire
            .wall_time
            .or(wire.system_time)
            .ok_or_else(|| "reading has neither WT nor ST".to_string())?;
        let timestamp = parse_share_date(&raw)
            .ok_or_else(|| format!("invalid reading time: {raw}"))?
            .with_timezone(&Utc);

        let device_time = match wire.display_time {
            Some(raw) => Some(
                parse_share_date(&raw).ok_or_else(|| format!("invalid display time: {raw}"))?,
            ),
            None => None,
        };

        Ok(Reading {
            timestamp,
            value: wire.value,
            trend: wire.trend,
            device_time,
        })
    }
}

/// Parse a Share date such as `/Date(1700000000000-0500)/`
///
/// The number is milliseconds since the Unix epoch; the optional suffix is the
/// UTC offset the instant should be presented in.
pub fn parse_share_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let inner = raw
        .trim()
        .trim_matches('/')
        .strip_prefix("Date(")?
        .strip_suffix(')')?;

    // Skip the first character so a negative epoch is not read as an offset
    let split = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(index, _)| index);

    let (millis, offset) = match split {
        Some(index) => (&inner[..index], parse_offset(&inner[index..])?),
        None => (inner, FixedOffset::east_opt(0)?),
    };

    let millis: i64 = millis.parse().ok()?;
    let utc = DateTime::<Utc>::from_timestamp_millis(millis)?;
    Some(utc.with_timezone(&offset))
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let bytes = raw.as_bytes();
    if bytes.len() != 5 || !bytes[1..].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = raw[1..3].parse().ok()?;
    let minutes: i32 = raw[3..5].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_serialization() {
        let credentials = Credentials::new("alice", "hunter2");
        let json = serde_json::to_value(credentials.login_request()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "accountName": "alice",
                "password": "hunter2",
                "applicationId": DEFAULT_APPLICATION_ID,
            })
        );
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("alice", "hunter2").with_application_id("app");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("alice"));
        assert!(debug.contains("app"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_trend_from_code() {
        assert_eq!(Trend::from_code(0), Trend::None);
        assert_eq!(Trend::from_code(4), Trend::Flat);
        assert_eq!(Trend::from_code(9), Trend::RateOutOfRange);
        assert_eq!(Trend::from_code(10), Trend::Unknown);
        assert_eq!(Trend::from_code(-1), Trend::Unknown);
    }

    #[test]
    fn test_trend_deserialize_name_and_code() {
        let trends: Vec<Trend> =
            serde_json::from_str(r#"["Flat", "fortyfivedown", 1, "7", "Sideways"]"#).unwrap();
        assert_eq!(
            trends,
            vec![
                Trend::Flat,
                Trend::FortyFiveDown,
                Trend::DoubleUp,
                Trend::DoubleDown,
                Trend::Unknown
            ]
        );
    }

    #[test]
    fn test_trend_of_unexpected_type_is_unknown() {
        let trends: Vec<Trend> =
            serde_json::from_str(r#"[4.0, true, null, 99, {"x": 1}, 18446744073709551615]"#)
                .unwrap();
        assert!(trends.iter().all(|trend| *trend == Trend::Unknown), "{trends:?}");
    }

    #[test]
    fn test_odd_trend_does_not_fail_reading_list() {
        let readings: Vec<Reading> = serde_json::from_str(
            r#"[
                {"WT": "/Date(1700000300000)/", "Value": 130, "Trend": 2.5},
                {"WT": "/Date(1700000000000)/", "Value": 125, "Trend": "Flat"}
            ]"#,
        )
        .unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].trend, Trend::Unknown);
        assert_eq!(readings[1].trend, Trend::Flat);
    }

    #[test]
    fn test_trend_arrow() {
        assert_eq!(Trend::Flat.arrow(), "→");
        assert_eq!(Trend::DoubleDown.arrow(), "⇊");
        assert_eq!(Trend::NotComputable.arrow(), "");
    }

    #[test]
    fn test_parse_share_date() {
        let utc = parse_share_date("/Date(1700000000000)/").unwrap();
        assert_eq!(utc.timestamp(), 1_700_000_000);
        assert_eq!(utc.offset().local_minus_utc(), 0);

        let local = parse_share_date("Date(1700000000000-0500)").unwrap();
        assert_eq!(local.timestamp(), 1_700_000_000);
        assert_eq!(local.offset().local_minus_utc(), -5 * 3600);

        let east = parse_share_date("/Date(1700000000000+0130)/").unwrap();
        assert_eq!(east.offset().local_minus_utc(), 90 * 60);
    }

    #[test]
    fn test_parse_share_date_rejects_garbage() {
        assert!(parse_share_date("2023-11-14T22:13:20Z").is_none());
        assert!(parse_share_date("Date()").is_none());
        assert!(parse_share_date("Date(abc)").is_none());
        assert!(parse_share_date("Date(1700000000000-05)").is_none());
    }

    #[test]
    fn test_reading_from_wire() {
        let reading: Reading = serde_json::from_str(
            r#"{
                "DT": "/Date(1700000000000-0500)/",
                "ST": "/Date(1700000000000)/",
                "WT": "/Date(1700000001000)/",
                "Value": 120,
                "Trend": "Flat"
            }"#,
        )
        .unwrap();

        assert_eq!(reading.value, 120.0);
        assert_eq!(reading.trend, Trend::Flat);
        assert_eq!(reading.timestamp.timestamp(), 1_700_000_001);
        assert_eq!(
            reading.device_time.unwrap().offset().local_minus_utc(),
            -5 * 3600
        );
    }

    #[test]
    fn test_reading_falls_back_to_system_time() {
        let reading: Reading =
            serde_json::from_str(r#"{"ST": "Date(1700000000000)", "value": 98, "trend": 5}"#)
                .unwrap();
        assert_eq!(reading.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(reading.trend, Trend::FortyFiveDown);
        assert!(reading.device_time.is_none());
    }

    #[test]
    fn test_reading_without_time_is_rejected() {
        let result = serde_json::from_str::<Reading>(r#"{"Value": 120, "Trend": "Flat"}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("neither WT nor ST"));
    }

    #[test]
    fn test_value_in_mmol() {
        let reading: Reading =
            serde_json::from_str(r#"{"WT": "Date(1700000000000)", "Value": 180}"#).unwrap();
        assert_eq!(reading.trend, Trend::Unknown);
        assert_eq!(reading.value_in(GlucoseUnit::MgDl), 180.0);
        assert!((reading.value_in(GlucoseUnit::Mmol) - 9.991).abs() < 0.001);
    }

    #[test]
    fn test_delta() {
        let readings: Vec<Reading> = serde_json::from_str(
            r#"[
                {"WT": "Date(1700000300000)", "Value": 126, "Trend": "FortyFiveUp"},
                {"WT": "Date(1700000000000)", "Value": 120, "Trend": "Flat"}
            ]"#,
        )
        .unwrap();

        assert_eq!(delta(&readings), Some(6.0));
        assert_eq!(delta(&readings[..1]), None);
        assert_eq!(delta(&[]), None);
    }
}
