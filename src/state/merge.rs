//! Deep merge for environment value layers.
//!
//! Later layers override earlier ones key by key. Mappings are merged
//! recursively and sequences or scalars are replaced entirely. A null in a
//! later layer leaves the earlier value in place, so a bare `key:` in a
//! values file does not erase what an earlier file set.

use serde_json::{Map, Value};

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers and booleans are replaced entirely
/// - Null in overlay preserves the base value
///
/// # Example
/// ```
/// use serde_json::json;
/// use deploy_state::state::deep_merge;
///
/// let base = json!({
///     "db": { "host": "localhost", "port": 5432 },
///     "replicas": [1, 2]
/// });
/// let overlay = json!({
///     "db": { "port": 6432 },
///     "replicas": [3]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(
///     result,
///     json!({ "db": { "host": "localhost", "port": 6432 }, "replicas": [3] })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            merge_into(&mut base_map, overlay_map);
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge `overlay` into the accumulator `acc` in place.
///
/// This is the override merge applied once per value or secret layer.
pub fn merge_into(acc: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, overlay_value) in overlay {
        let merged_value = match acc.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        acc.insert(key, merged_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_merge_simple_objects() {
        let result = deep_merge(json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4}));
        assert_eq!(result, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_nested_objects_is_recursive_union() {
        let mut acc = map(json!({"x": {"p": 1, "q": 2}}));
        merge_into(&mut acc, map(json!({"x": {"q": 3, "r": 4}})));
        assert_eq!(Value::Object(acc), json!({"x": {"p": 1, "q": 3, "r": 4}}));
    }

    #[test]
    fn test_arrays_replaced_not_merged() {
        let mut acc = map(json!({"x": [1, 2]}));
        merge_into(&mut acc, map(json!({"x": [3]})));
        assert_eq!(Value::Object(acc), json!({"x": [3]}));
    }

    #[test]
    fn test_null_overlay_preserves_base() {
        let result = deep_merge(json!({"a": 1, "b": {"c": 2}}), json!({"a": null, "b": null}));
        assert_eq!(result, json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn test_null_for_new_key_is_kept() {
        let mut acc = map(json!({"a": 1}));
        merge_into(&mut acc, map(json!({"b": null})));
        assert_eq!(Value::Object(acc), json!({"a": 1, "b": null}));
    }

    #[test]
    fn test_deep_nested_merge() {
        let base = json!({
            "level1": {
                "level2": {
                    "level3": {"a": 1, "b": 2}
                }
            }
        });
        let overlay = json!({
            "level1": {
                "level2": {
                    "level3": {"b": 3, "c": 4}
                }
            }
        });
        assert_eq!(
            deep_merge(base, overlay),
            json!({
                "level1": {
                    "level2": {
                        "level3": {"a": 1, "b": 3, "c": 4}
                    }
                }
            })
        );
    }

    #[test]
    fn test_overlay_replaces_primitive_with_object() {
        let result = deep_merge(json!({"value": 42}), json!({"value": {"nested": true}}));
        assert_eq!(result, json!({"value": {"nested": true}}));
    }

    #[test]
    fn test_overlay_replaces_object_with_primitive() {
        let result = deep_merge(json!({"value": {"nested": true}}), json!({"value": 42}));
        assert_eq!(result, json!({"value": 42}));
    }

    #[test]
    fn test_overlay_replaces_array_with_object() {
        let result = deep_merge(json!({"value": [1, 2]}), json!({"value": {"k": "v"}}));
        assert_eq!(result, json!({"value": {"k": "v"}}));
    }
}
