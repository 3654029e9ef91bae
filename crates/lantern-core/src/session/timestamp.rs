//! Serde representation for persisted timestamps.
//!
//! Timestamps are written as RFC 3339 strings in UTC. Reading accepts either
//! an RFC 3339 string or a legacy epoch-millisecond number, and always yields
//! a typed `DateTime<Utc>`.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Rfc3339(String),
    EpochMillis(i64),
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match TimestampRepr::deserialize(deserializer)? {
        TimestampRepr::Rfc3339(text) => DateTime::parse_from_rfc3339(&text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", text, e))),
        TimestampRepr::EpochMillis(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", millis))),
    }
}
