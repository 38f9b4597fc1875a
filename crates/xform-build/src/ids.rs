//! Fresh identifiers for cloned nodes.

use serde_json::Value;

use crate::error::{BuildError, Result};

/// Largest key anywhere in `value` that is an unsigned integer written as a
/// string, at any depth (including keys of nested `child_forms`).
pub fn max_numeric_key(value: &Value) -> Option<u64> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, child)| {
                let own = parse_numeric_key(key);
                let nested = max_numeric_key(child);
                own.max(nested)
            })
            .max(),
        Value::Array(items) => items.iter().filter_map(max_numeric_key).max(),
        _ => None,
    }
}

fn parse_numeric_key(key: &str) -> Option<u64> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// Monotonic identifier source for one build run.
#[derive(Debug, Clone)]
pub struct IdFactory {
    last: u64,
}

impl IdFactory {
    /// Counter start when the template has no integer-like keys.
    pub const DEFAULT_SEED: u64 = 10_000;

    /// The first identifier issued will be `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Fails once the counter would pass `u64::MAX` instead of wrapping onto
    /// identifiers that may already be in use.
    pub fn next_id(&mut self) -> Result<String> {
        self.last = self
            .last
            .checked_add(1)
            .ok_or(BuildError::IdsExhausted { last: self.last })?;
        Ok(self.last.to_string())
    }

    /// Most recently issued value (or the seed if none was issued yet).
    pub fn last(&self) -> u64 {
        self.last
    }
}
