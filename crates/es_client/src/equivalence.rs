//! Mapping equivalence, used by the reconciler to decide whether a live
//! index's mapping has drifted from the derived one.

use std::collections::BTreeSet;

use serde_json::Value;

/// Two schemas are equivalent iff the sorted key sets of `properties` match,
/// every non-`join` property compares equal, and `join` compares equal under
/// [`join_equivalent`]. A missing mapping on either side is never
/// equivalent.
///
/// Both `live_mapping` and `derived_mapping` are the `mappings` subobject
/// itself (i.e. `{"properties": {...}}`), not a full index schema with a
/// `mappings` wrapper — callers holding a full derived schema must index
/// into `["mappings"]` before calling this.
pub fn equivalent(live_mapping: Option<&Value>, derived_mapping: &Value) -> bool {
    let Some(live) = live_mapping else {
        return false;
    };
    let (Some(live_props), Some(derived_props)) =
        (properties_of(live), properties_of(derived_mapping))
    else {
        return false;
    };

    let live_keys: BTreeSet<&String> = live_props.keys().collect();
    let derived_keys: BTreeSet<&String> = derived_props.keys().collect();
    if live_keys != derived_keys {
        return false;
    }

    for key in derived_keys {
        let live_value = &live_props[key];
        let derived_value = &derived_props[key];
        let equal = if key == "join" {
            join_equivalent(live_value, derived_value)
        } else {
            live_value == derived_value
        };
        if !equal {
            return false;
        }
    }
    true
}

fn properties_of(mapping: &Value) -> Option<&serde_json::Map<String, Value>> {
    mapping.get("properties")?.as_object()
}

/// Two `join` property values are equivalent when their `relations` maps
/// have identical keys and, per key, the relation value compares equal
/// after coercing a single-element list to its scalar and sorting any list.
fn join_equivalent(a: &Value, b: &Value) -> bool {
    if a.get("type") != b.get("type") {
        return false;
    }
    let (Some(a_rel), Some(b_rel)) =
        (a.get("relations").and_then(Value::as_object), b.get("relations").and_then(Value::as_object))
    else {
        return a.get("relations") == b.get("relations");
    };
    let a_keys: BTreeSet<&String> = a_rel.keys().collect();
    let b_keys: BTreeSet<&String> = b_rel.keys().collect();
    if a_keys != b_keys {
        return false;
    }
    a_keys.into_iter().all(|k| normalize_relation(&a_rel[k]) == normalize_relation(&b_rel[k]))
}

fn normalize_relation(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut names: Vec<String> =
                items.iter().filter_map(|v| v.as_str().map(String::from)).collect();
            names.sort();
            match names.as_slice() {
                [single] => Value::String(single.clone()),
                _ => Value::Array(names.into_iter().map(Value::String).collect()),
            }
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Builds a `mappings` subobject — the shape both `equivalent()`
    /// arguments take, not a full index schema.
    fn schema(properties: Value) -> Value {
        json!({ "properties": properties })
    }

    #[test]
    fn reflexive_for_any_built_schema() {
        let s = schema(json!({
            "id": { "type": "keyword" },
            "type": { "type": "keyword" },
            "join": { "type": "join", "relations": { "Parent": ["Apple", "Zebra"] } },
        }));
        let live = s.clone();
        assert!(equivalent(Some(&live), &s));
    }

    #[test]
    fn insensitive_to_child_list_ordering() {
        let derived = schema(json!({
            "join": { "type": "join", "relations": { "Parent": ["Apple", "Zebra"] } },
        }));
        let live = schema(json!({
            "join": { "type": "join", "relations": { "Parent": ["Zebra", "Apple"] } },
        }));
        assert!(equivalent(Some(&live), &derived));
    }

    #[test]
    fn insensitive_to_single_child_scalar_vs_list() {
        let derived = schema(json!({
            "join": { "type": "join", "relations": { "Parent": "Migraine" } },
        }));
        let live = schema(json!({
            "join": { "type": "join", "relations": { "Parent": ["Migraine"] } },
        }));
        assert!(equivalent(Some(&live), &derived));
    }

    #[test]
    fn missing_live_mapping_is_not_equivalent() {
        let derived = schema(json!({ "id": { "type": "keyword" } }));
        assert!(!equivalent(None, &derived));
    }

    #[test]
    fn differing_property_set_is_not_equivalent() {
        let derived = schema(json!({ "id": { "type": "keyword" } }));
        let live = schema(json!({ "wrong": { "type": "keyword" } }));
        assert!(!equivalent(Some(&live), &derived));
    }

    #[test]
    fn differing_property_type_is_not_equivalent() {
        let derived = schema(json!({ "id": { "type": "keyword" } }));
        let live = schema(json!({ "id": { "type": "text" } }));
        assert!(!equivalent(Some(&live), &derived));
    }

    proptest::proptest! {
        /// Equivalence is reflexive — any schema the builder could
        /// produce is equivalent to itself.
        #[test]
        fn reflexive_for_arbitrary_join_relations(
            children in proptest::collection::vec("[A-Za-z]{1,6}", 0..6),
        ) {
            let mut names: Vec<String> = children;
            names.sort();
            names.dedup();
            let relation = match names.as_slice() {
                [single] => Value::String(single.clone()),
                _ => json!(names),
            };
            let s = schema(json!({
                "id": { "type": "keyword" },
                "join": { "type": "join", "relations": { "Parent": relation } },
            }));
            let live = s.clone();
            prop_assert!(equivalent(Some(&live), &s));
        }

        /// Equivalence is insensitive to ordering — shuffling the children list
        /// never changes the equivalence verdict.
        #[test]
        fn insensitive_to_any_permutation(
            mut children in proptest::collection::vec("[A-Za-z]{1,6}", 2..6),
        ) {
            let derived = schema(json!({
                "join": { "type": "join", "relations": { "Parent": children.clone() } },
            }));
            children.reverse();
            let live = schema(json!({
                "join": { "type": "join", "relations": { "Parent": children } },
            }));
            prop_assert!(equivalent(Some(&live), &derived));
        }
    }
}
