//! Positional metadata for sequences in a render context.
//!
//! Every mapping element of every sequence (at any depth) gains four keys:
//!
//! | Key       | Value                         |
//! |-----------|-------------------------------|
//! | `@index`  | zero-based position           |
//! | `@first`  | `true` on element 0 only      |
//! | `@last`   | `true` on element N-1 only    |
//! | `isLast`  | same as `@last` (older templates spell it this way) |
//!
//! The transform builds a new value; the caller's data is left untouched.
//! Scalar elements cannot carry keys, so they are kept as-is and the renderer
//! answers the same names from its iteration frame instead.

use serde_json::{Map, Value};

pub const INDEX_KEY: &str = "@index";
pub const FIRST_KEY: &str = "@first";
pub const LAST_KEY: &str = "@last";
pub const LEGACY_LAST_KEY: &str = "isLast";

/// Names answered from positional metadata.
pub const POSITION_KEYS: [&str; 4] = [INDEX_KEY, FIRST_KEY, LAST_KEY, LEGACY_LAST_KEY];

/// Annotated copy of a render context.
pub fn annotate(context: &Map<String, Value>) -> Map<String, Value> {
    context
        .iter()
        .map(|(key, value)| (key.clone(), annotate_value(value)))
        .collect()
}

fn annotate_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let len = items.len();
            Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| annotate_element(item, index, len))
                    .collect(),
            )
        }
        Value::Object(map) => Value::Object(annotate(map)),
        other => other.clone(),
    }
}

fn annotate_element(item: &Value, index: usize, len: usize) -> Value {
    match annotate_value(item) {
        Value::Object(mut map) => {
            for key in POSITION_KEYS {
                map.insert(key.to_string(), position_value(key, index, len));
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Value of one positional key for element `index` of `len`.
pub fn position_value(key: &str, index: usize, len: usize) -> Value {
    match key {
        INDEX_KEY => Value::from(index),
        FIRST_KEY => Value::Bool(index == 0),
        _ => Value::Bool(index + 1 == len),
    }
}
