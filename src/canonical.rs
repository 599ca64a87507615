//! Canonical serialization.
//!
//! Hashing and signing both operate on the bytes produced here, so this
//! function is the compatibility contract between `seal` and `re_verify`.
//!
//! Rule: convert to a JSON value, sort object keys recursively, emit compact
//! UTF-8 JSON with no insignificant whitespace. `serde_json::Map` is backed
//! by a `BTreeMap` (the `preserve_order` feature is not enabled), so the
//! round-trip through `Value` performs the key sort.

use serde::Serialize;
use serde_json::Value;

use crate::error::EnvelopeError;

/// Serialize `value` to its canonical byte form.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EnvelopeError> {
    let tree = to_canonical_value(value)?;
    serde_json::to_vec(&tree).map_err(|e| EnvelopeError::Serialization(e.to_string()))
}

/// Serialize `value` to its canonical string form.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, EnvelopeError> {
    let tree = to_canonical_value(value)?;
    serde_json::to_string(&tree).map_err(|e| EnvelopeError::Serialization(e.to_string()))
}

fn to_canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, EnvelopeError> {
    let tree = serde_json::to_value(value).map_err(|e| EnvelopeError::Serialization(e.to_string()))?;
    Ok(sort_keys(tree))
}

// Rebuilds every object explicitly so ordering does not depend on which
// map implementation serde_json was compiled with.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
