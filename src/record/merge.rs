//! Recursive deep merge over nested value trees

use serde_json::Value;

/// Merge two nested values.
///
/// Precedence contract: for each key, if both sides hold nested maps
/// they merge recursively; otherwise the overlay value wins. A non-map
/// argument on either side resolves to the overlay.
#[must_use]
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => {
                        let merged = merge_values(existing.take(), value);
                        *existing = merged;
                    }
                    None => {
                        base.insert(key, value);
                    }
                }
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}
