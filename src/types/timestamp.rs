//! Heterogeneous timestamp representations.
//!
//! The server emits timestamps in several raw forms depending on which
//! storage path produced them: an ISO-8601 string, a bare epoch number
//! (seconds or milliseconds), or a BSON-style wrapper `{"$date": ...}`.
//! `RawTimestamp` deserializes all of them and resolves to a single
//! `DateTime<Utc>`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Epoch values below this are interpreted as seconds, at or above as
/// milliseconds.
const EPOCH_MILLIS_CUTOFF: f64 = 10_000_000_000.0;

/// A timestamp as it appears on the wire, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Bare epoch number, seconds or milliseconds.
    Epoch(f64),
    /// ISO-8601 / RFC 3339 string.
    Iso(String),
    /// BSON extended-JSON wrapper; the inner value is itself heterogeneous.
    Wrapped {
        #[serde(rename = "$date")]
        date: Box<RawTimestamp>,
    },
}

impl RawTimestamp {
    /// Resolve to a concrete instant. Returns `None` for unparseable input.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(n) => {
                if !n.is_finite() || *n <= 0.0 {
                    return None;
                }
                let millis = if *n < EPOCH_MILLIS_CUTOFF {
                    n * 1000.0
                } else {
                    *n
                };
                Utc.timestamp_millis_opt(millis as i64).single()
            }
            Self::Iso(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Some(dt.with_timezone(&Utc));
                }
                // ISO strings without an offset are treated as UTC.
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }
            Self::Wrapped { date } => date.resolve(),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Iso(dt.to_rfc3339())
    }
}
