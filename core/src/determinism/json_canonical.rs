use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

// Canonical form for every persisted manifest and hashed audit event:
// - UTF-8 JSON, no BOM
// - object keys sorted lexicographically at every depth
// - no insignificant whitespace
// - integers only; a float anywhere is rejected
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    let v = serde_json::to_value(value)?;
    let normalized = normalize_value(v)?;
    Ok(serde_json::to_vec(&normalized)?)
}

fn normalize_value(v: Value) -> CoreResult<Value> {
    match v {
        Value::Object(map) => {
            let mut sorted: BTreeMap<String, Value> = BTreeMap::new();
            for (k, vv) in map {
                sorted.insert(k, normalize_value(vv)?);
            }
            // serde_json::Map keeps insertion order once preserve_order is on anywhere
            // in the dependency graph, so rebuild from the sorted map.
            let mut out = serde_json::Map::new();
            for (k, vv) in sorted {
                out.insert(k, vv);
            }
            Ok(Value::Object(out))
        }
        Value::Array(arr) => arr
            .into_iter()
            .map(normalize_value)
            .collect::<CoreResult<Vec<_>>>()
            .map(Value::Array),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Ok(Value::Number(n))
            } else {
                Err(CoreError::DeterminismViolation(format!(
                    "canonical JSON forbids non-integer number {}",
                    n
                )))
            }
        }
        other => Ok(other),
    }
}
