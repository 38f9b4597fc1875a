//! Tolerant field decoding for hand-edited templates.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a scalar as text: `null` becomes empty, numbers and booleans are
/// rendered, strings pass through.
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(value_to_text).unwrap_or_default())
}

pub(crate) fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Keep a member that is present, even as `null`. Pair with
/// `#[serde(default)]` so only an absent member reads as `None`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
