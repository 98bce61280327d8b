//! Normalization of the API's inconsistent response envelopes
//!
//! List endpoints answer in several shapes depending on the resource and the
//! backend version:
//!
//! ```json
//! { "success": true, "data": { "items": [...], "total": 42 } }
//! { "items": [...], "pagination": { "total": 42, "totalPages": 3 } }
//! { "data": [...] }
//! [...]
//! ```
//!
//! Anything else decodes to an empty collection rather than an error.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// A list response reduced to its parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Raw items, in server order
    pub items: Vec<Value>,
    /// Collection size, if the server reported one
    pub total: Option<u64>,
    /// Page count, if the server reported one
    pub total_pages: Option<u32>,
}

/// Reduce a list response body to an [`Envelope`]
#[must_use]
pub fn normalize(body: &Value) -> Envelope {
    Envelope {
        items: items(body),
        total: find_u64(body, "total"),
        total_pages: find_u64(body, "totalPages").and_then(|n| u32::try_from(n).ok()),
    }
}

/// Item array of a list response
///
/// Precedence: `data.items`, then `items`, then `data` when it is an array,
/// then a bare array body; otherwise empty.
#[must_use]
pub fn items(body: &Value) -> Vec<Value> {
    let candidates = [
        body.pointer("/data/items"),
        body.get("items"),
        body.get("data"),
        Some(body),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Decode raw items into records, skipping (and logging) any that do not
/// fit `T`
pub fn decode_items<T: DeserializeOwned>(resource: &str, items: Vec<Value>) -> Vec<T> {
    let received = items.len();
    let records: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(resource, index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect();

    if records.len() < received {
        warn!(
            resource,
            received,
            kept = records.len(),
            "some records could not be decoded"
        );
    }
    records
}

/// Human-readable `message` (or string `error`) from a response body
#[must_use]
pub fn message(body: &Value) -> Option<String> {
    ["/message", "/error", "/data/message"]
        .into_iter()
        .filter_map(|pointer| body.pointer(pointer))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(ToString::to_string)
}

/// Whether a 2xx body nevertheless reports failure (`"success": false`)
#[must_use]
pub fn reports_failure(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(false)
}

fn find_u64(body: &Value, key: &str) -> Option<u64> {
    [
        format!("/{key}"),
        format!("/data/{key}"),
        format!("/pagination/{key}"),
        format!("/data/pagination/{key}"),
    ]
    .iter()
    .filter_map(|pointer| body.pointer(pointer))
    .find_map(|v| {
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    })
}
