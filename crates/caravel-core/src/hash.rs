//! Canonical JSON hashing.
//!
//! Pod-template specs and canary step lists are compared by digest:
//! the digest must be stable across process restarts and independent
//! of map key ordering, so objects are rewritten with recursively
//! sorted keys before hashing.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hash any serializable value into a hex sha256 digest of its
/// canonical JSON form.
pub fn canonical_hash<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_value(value).unwrap_or(Value::Null);
    let canonical = canonicalize(json);
    // Compact serialization of an already-canonical tree is deterministic.
    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    hex::encode(digest)
}

/// Rewrite a JSON tree with all object keys sorted.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = serde_json::Map::new();
            for (k, v) in entries {
                sorted.insert(k, canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
