//! Deep key conversion between snake_case (storage) and camelCase (application).
//!
//! Used on rows that come back from the raw query path, which bypasses the
//! mapping layer and therefore still carries storage-native column names.

use convert_case::{Case, Casing};
use serde_json::{Map, Value};

/// Default nesting depth for [`snake_to_hump`] / [`hump_to_snake`].
pub const DEFAULT_CASE_DEPTH: usize = 10;

/// Convert a single key to camelCase (`created_by_id` -> `createdById`).
pub fn snake_to_hump_key(key: &str) -> String {
    key.to_case(Case::Camel)
}

/// Convert a single key to snake_case (`createdById` -> `created_by_id`).
pub fn hump_to_snake_key(key: &str) -> String {
    key.to_case(Case::Snake)
}

/// Return a copy of `value` with every object key converted to camelCase.
///
/// Objects and arrays each count as one level; anything nested deeper than
/// `depth` levels is copied unconverted.
pub fn snake_to_hump(value: &Value, depth: usize) -> Value {
    convert(value, depth, snake_to_hump_key)
}

/// Return a copy of `value` with every object key converted to snake_case.
///
/// Same depth rules as [`snake_to_hump`].
pub fn hump_to_snake(value: &Value, depth: usize) -> Value {
    convert(value, depth, hump_to_snake_key)
}

/// Convert the keys of a flat record (one level).
pub fn record_to_snake(record: &Map<String, Value>) -> Map<String, Value> {
    record
        .iter()
        .map(|(k, v)| (hump_to_snake_key(k), v.clone()))
        .collect()
}

fn convert(value: &Value, depth: usize, key_fn: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) if depth > 0 => Value::Object(
            map.iter()
                .map(|(k, v)| (key_fn(k), convert(v, depth - 1, key_fn)))
                .collect(),
        ),
        Value::Array(items) if depth > 0 => Value::Array(
            items.iter().map(|v| convert(v, depth - 1, key_fn)).collect(),
        ),
        other => other.clone(),
    }
}
