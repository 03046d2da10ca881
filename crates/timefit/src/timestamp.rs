//! Timestamp normalization across heterogeneous representations.
//!
//! Events carry their boundaries in whatever form their source produced:
//! zone-aware or zone-naive timestamps, integer or float Unix epochs,
//! ISO 8601 text, or raw JSON payloads. [`normalize`] folds all of these
//! into a canonical [`Timestamp`], attaching an optional fallback zone to
//! inputs that carry no zone of their own.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while normalizing or comparing timestamps.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimestampError {
    /// The value is not one of the recognized timestamp representations.
    #[error("unsupported timestamp value: {given}")]
    InvalidKind { given: String },

    /// Timestamp text that does not parse as ISO 8601.
    #[error("invalid timestamp text {text:?}")]
    Parse {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Comparison between a zone-aware and a zone-naive timestamp.
    #[error("cannot compare zone-aware and zone-naive timestamps")]
    MixedAwareness,
}

/// A canonical point in time, either zone-aware or zone-naive.
///
/// Two timestamps are comparable only when both are aware or both are
/// naive; aware timestamps compare as instants regardless of their offset.
/// Mixed comparisons fail with [`TimestampError::MixedAwareness`], which is
/// why `Timestamp` implements [`PartialOrd`] but not `Ord`.
#[derive(Debug, Clone, Copy)]
pub enum Timestamp {
    /// Carries an explicit UTC offset.
    Aware(DateTime<FixedOffset>),
    /// Wall-clock time with no zone attached.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Returns `true` when the timestamp carries a zone.
    #[must_use]
    pub const fn is_aware(&self) -> bool {
        matches!(self, Self::Aware(_))
    }

    /// Returns the instant in UTC, or `None` for a naive timestamp.
    #[must_use]
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Aware(dt) => Some(dt.with_timezone(&Utc)),
            Self::Naive(_) => None,
        }
    }

    /// Compares two timestamps, failing on an aware/naive mix.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, TimestampError> {
        match (self, other) {
            (Self::Aware(a), Self::Aware(b)) => Ok(a.cmp(b)),
            (Self::Naive(a), Self::Naive(b)) => Ok(a.cmp(b)),
            _ => Err(TimestampError::MixedAwareness),
        }
    }

    /// Attaches `zone` to a naive timestamp, interpreting it as wall time
    /// in that zone. Aware timestamps pass through unchanged.
    #[must_use]
    pub fn or_zone(self, zone: FixedOffset) -> Self {
        match self {
            Self::Aware(_) => self,
            Self::Naive(naive) => Self::Aware(attach_zone(naive, zone)),
        }
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.try_cmp(other).is_ok_and(Ordering::is_eq)
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aware(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse_text(&text).map_err(serde::de::Error::custom)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Aware(dt.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::Aware(dt)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(naive: NaiveDateTime) -> Self {
        Self::Naive(naive)
    }
}

/// A raw start/stop value as extracted from an event, before normalization.
#[derive(Debug, Clone)]
pub enum TimeValue {
    /// An already-normalized timestamp, aware or naive.
    Stamp(Timestamp),
    /// Unix epoch seconds.
    Epoch(i64),
    /// Unix epoch seconds with a fractional part.
    EpochFloat(f64),
    /// ISO 8601 text.
    Text(String),
    /// A raw JSON payload; strings and numbers are accepted.
    Json(serde_json::Value),
}

impl From<Timestamp> for TimeValue {
    fn from(stamp: Timestamp) -> Self {
        Self::Stamp(stamp)
    }
}

impl From<DateTime<Utc>> for TimeValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Stamp(dt.into())
    }
}

impl From<DateTime<FixedOffset>> for TimeValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::Stamp(dt.into())
    }
}

impl From<NaiveDateTime> for TimeValue {
    fn from(naive: NaiveDateTime) -> Self {
        Self::Stamp(naive.into())
    }
}

impl From<i64> for TimeValue {
    fn from(epoch: i64) -> Self {
        Self::Epoch(epoch)
    }
}

impl From<f64> for TimeValue {
    fn from(epoch: f64) -> Self {
        Self::EpochFloat(epoch)
    }
}

impl From<&str> for TimeValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for TimeValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for TimeValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Normalizes a raw extraction result into a canonical [`Timestamp`].
///
/// Aware inputs pass through unchanged. Naive inputs (timestamps and
/// offset-less text) stay naive unless `fallback_zone` is given, in which
/// case they are interpreted as wall time in that zone. Numeric inputs are
/// Unix epoch seconds and always come out aware, in UTC or converted to the
/// fallback zone's offset.
pub fn normalize(
    value: impl Into<TimeValue>,
    fallback_zone: Option<FixedOffset>,
) -> Result<Timestamp, TimestampError> {
    let stamp = match value.into() {
        TimeValue::Stamp(stamp) => stamp,
        TimeValue::Epoch(secs) => {
            let utc = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| TimestampError::InvalidKind {
                    given: secs.to_string(),
                })?;
            return Ok(rezone(utc, fallback_zone));
        }
        TimeValue::EpochFloat(secs) => return epoch_float(secs, fallback_zone),
        TimeValue::Text(text) => parse_text(&text)?,
        TimeValue::Json(value) => return from_json(value, fallback_zone),
    };
    Ok(match fallback_zone {
        Some(zone) => stamp.or_zone(zone),
        None => stamp,
    })
}

/// Epoch seconds with sub-second precision, truncated to microseconds.
fn epoch_float(
    secs: f64,
    fallback_zone: Option<FixedOffset>,
) -> Result<Timestamp, TimestampError> {
    if !secs.is_finite() {
        return Err(TimestampError::InvalidKind {
            given: secs.to_string(),
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    let micros = (secs * 1_000_000.0) as i64;
    let utc = DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        TimestampError::InvalidKind {
            given: secs.to_string(),
        }
    })?;
    Ok(rezone(utc, fallback_zone))
}

fn from_json(
    value: serde_json::Value,
    fallback_zone: Option<FixedOffset>,
) -> Result<Timestamp, TimestampError> {
    match value {
        serde_json::Value::String(text) => normalize(text, fallback_zone),
        serde_json::Value::Number(number) => {
            if let Some(secs) = number.as_i64() {
                normalize(secs, fallback_zone)
            } else if let Some(secs) = number.as_f64() {
                normalize(secs, fallback_zone)
            } else {
                Err(TimestampError::InvalidKind {
                    given: number.to_string(),
                })
            }
        }
        other => Err(TimestampError::InvalidKind {
            given: json_kind(&other).to_owned(),
        }),
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// RFC 3339 text becomes aware; offset-less datetimes and bare dates take
/// the naive path.
fn parse_text(text: &str) -> Result<Timestamp, TimestampError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Timestamp::Aware(dt));
    }
    if let Ok(naive) = text.parse::<NaiveDateTime>() {
        return Ok(Timestamp::Naive(naive));
    }
    match text.parse::<NaiveDate>() {
        Ok(date) => Ok(Timestamp::Naive(date.and_time(NaiveTime::MIN))),
        Err(source) => Err(TimestampError::Parse {
            text: text.to_owned(),
            source,
        }),
    }
}

/// Interprets `naive` as wall time in `zone`.
fn attach_zone(naive: NaiveDateTime, zone: FixedOffset) -> DateTime<FixedOffset> {
    // A fixed offset maps local wall time one-to-one.
    zone.from_local_datetime(&naive)
        .single()
        .unwrap_or_else(|| DateTime::from_naive_utc_and_offset(naive - zone, zone))
}

fn rezone(utc: DateTime<Utc>, fallback_zone: Option<FixedOffset>) -> Timestamp {
    match fallback_zone {
        Some(zone) => Timestamp::Aware(utc.with_timezone(&zone)),
        None => Timestamp::Aware(utc.fixed_offset()),
    }
}
