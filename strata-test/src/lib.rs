//! Test utilities for Strata.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`MemoryRepository`] | In-memory repository that records every call as a [`RepoCall`] |
//! | [`record`] | Build a [`Record`](strata_data::Record) from a `json!` object |

mod memory;

pub use memory::{matches, MemoryRepository, RepoCall};

use serde_json::Value;
use strata_data::Record;

/// Build a record from a JSON object literal.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("record() expects a JSON object, got {other}"),
    }
}
