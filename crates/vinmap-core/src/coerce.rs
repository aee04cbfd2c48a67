//! Lenient field deserializers applied at the ingestion boundary.
//!
//! Upstream enrichment output is loosely typed: numbers sometimes arrive as
//! strings, placeholders like `"N/A"` appear where a price is unknown, and
//! nested objects are occasionally replaced by scalars. Every raw record field
//! goes through one of these helpers so the rest of the pipeline only ever
//! sees `Option`s with finite values.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::text::normalize_whitespace;

/// Finite number from a JSON value; numeric strings are accepted.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Non-negative whole count from a JSON value. Fractional or out-of-range
/// values are absent rather than rounded or saturated.
pub fn count(value: &Value) -> Option<u64> {
    number(value)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v < u64::MAX as f64)
        .map(|v| v as u64)
}

/// Whitespace-normalized, non-empty text. Numbers are rendered as text so
/// numeric upstream ids survive.
pub fn text(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => normalize_whitespace(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

pub fn safe_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number))
}

pub fn safe_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count))
}

pub fn safe_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text))
}

/// `{ name: count }` objects; entries with unusable keys or counts are dropped.
pub fn safe_count_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(map)) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .iter()
        .filter_map(|(key, v)| {
            let key = normalize_whitespace(key);
            if key.is_empty() {
                return None;
            }
            count(v).map(|n| (key, n))
        })
        .collect())
}

/// String arrays; non-string members are skipped.
pub fn safe_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(None);
    };
    Ok(Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(normalize_whitespace))
            .filter(|s| !s.is_empty())
            .collect(),
    ))
}

/// Nested objects that fail to match their schema become `None` instead of
/// failing the whole document.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
