//! Shared data types and lenient field decoding
//!
//! The marketplace API is loose about field types: numbers sometimes arrive
//! as strings, timestamps are occasionally malformed, and almost any field
//! may be missing. The helpers here decode such fields to `None` instead of
//! failing the whole record.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Record identifier as sent by the API (`id` or `_id`)
pub type RecordId = String;

/// Reference to the user who owns or created a record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Owner identifier
    #[serde(default, alias = "_id")]
    pub id: Option<RecordId>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Email address
    #[serde(default)]
    pub email: Option<String>,
}

impl Owner {
    /// Name if present, otherwise email, otherwise an empty string
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_default()
    }
}

/// Decode a number that may be sent as a JSON number, a numeric string, or
/// anything else (which becomes `None`)
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Decode an unsigned count leniently; negative or fractional input is
/// truncated toward zero
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|n| n.is_finite())
        .map(|n| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = n.max(0.0) as u64;
            count
        }))
}

/// Decode an RFC 3339 timestamp; malformed values become `None`
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

/// Decode a boolean that may arrive as `true`/`false`, `"true"`/`"false"`,
/// or `0`/`1`
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Decode any field, falling back to `T::default()` when the value is null
/// or has an unexpected shape
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a record id sent either as a string or as a number
///
/// # Errors
///
/// Fails when the id is missing, empty, or neither a string nor a number;
/// such a record cannot be acted upon.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<RecordId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

/// Parse an RFC 3339 timestamp, also accepting a bare `YYYY-MM-DD` date
/// (interpreted as midnight UTC)
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
