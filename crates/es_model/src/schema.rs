use std::collections::BTreeMap;

use serde_json::{
    json,
    Value,
};

use crate::field_type::FieldType;

/// The fixed analysis configuration shared by every managed index,
/// "Index schema"): a `whitespace` tokenizer, lowercased, with an
/// ASCII-folding filter that keeps the original token alongside the folded
/// one so that both accented and unaccented queries match.
pub fn fixed_settings() -> Value {
    json!({
        "analysis": {
            "analyzer": {
                "default": {
                    "type": "custom",
                    "tokenizer": "whitespace",
                    "filter": ["lowercase", "asciifolding_preserve"],
                },
            },
            "filter": {
                "asciifolding_preserve": {
                    "type": "asciifolding",
                    "preserve_original": true,
                },
            },
        },
    })
}

/// The value of a `join` relations entry: a single child name when there is
/// exactly one, a sorted list otherwise.
pub fn relations_value(mut children: Vec<String>) -> Value {
    children.sort();
    children.dedup();
    match children.as_slice() {
        [single] => Value::String(single.clone()),
        _ => Value::Array(children.into_iter().map(Value::String).collect()),
    }
}

/// Assembles the full index schema JSON for a model: its own properties
/// merged with every child's, the `type: keyword` discriminator, and — if
/// the model has children — the `join` field.
///
/// `properties` is the already-merged, already-conflict-checked property map
/// (own model document_name -> own model's merge is the caller's
/// responsibility, see [`crate::ModelRegistry::build`]); this function only
/// assembles the final JSON shape.
pub fn build_schema(
    properties: &BTreeMap<String, FieldType>,
    document_name: &str,
    children: &[String],
) -> Value {
    let mut props = serde_json::Map::new();
    for (name, ty) in properties {
        props.insert(name.clone(), json!({ "type": ty.as_str() }));
    }
    props.insert("type".to_string(), json!({ "type": "keyword" }));

    if !children.is_empty() {
        let mut relations = serde_json::Map::new();
        relations.insert(document_name.to_string(), relations_value(children.to_vec()));
        props.insert(
            "join".to_string(),
            json!({ "type": "join", "relations": Value::Object(relations) }),
        );
    }

    json!({
        "settings": fixed_settings(),
        "mappings": { "properties": Value::Object(props) },
    })
}
