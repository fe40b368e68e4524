//! Recursive merge of JSON attribute documents.

use serde_json::Value;

/// Merge `patch` onto `base`.
///
/// Objects merge key by key, recursively. Anything else in `patch`
/// (scalars, arrays, null) replaces the value in `base`.
pub fn deep_merge(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, patch_value) in patch_map {
                let value = match merged.get(key) {
                    Some(base_value) => deep_merge(base_value, patch_value),
                    None => patch_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_merge() {
        let base = json!({"a": {"x": 1, "y": 2}, "b": 3});
        let patch = json!({"a": {"y": 20, "z": 30}});
        assert_eq!(
            deep_merge(&base, &patch),
            json!({"a": {"x": 1, "y": 20, "z": 30}, "b": 3})
        );
    }

    #[test]
    fn arrays_and_scalars_replace() {
        let base = json!({"list": [1, 2, 3], "flag": true});
        let patch = json!({"list": [9], "flag": null});
        assert_eq!(deep_merge(&base, &patch), json!({"list": [9], "flag": null}));
    }

    #[test]
    fn object_replaces_scalar() {
        let base = json!({"a": "text"});
        let patch = json!({"a": {"nested": 1}});
        assert_eq!(deep_merge(&base, &patch), json!({"a": {"nested": 1}}));
    }

    #[test]
    fn empty_patch_keeps_base() {
        let base = json!({"a": {"b": 1}});
        assert_eq!(deep_merge(&base, &json!({})), base);
    }
}
