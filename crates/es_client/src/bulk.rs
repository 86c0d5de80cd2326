//! Bulk-API action framing and fan-out writes: turning a document write
//! into one or more newline-delimited bulk actions.

use serde_json::{
    json,
    Value,
};

/// One of the three bulk operations a document write can use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

impl WriteOp {
    fn action_name(self) -> &'static str {
        match self {
            WriteOp::Create => "create",
            WriteOp::Update => "update",
            WriteOp::Delete => "delete",
        }
    }
}

/// The `join` field value attached to a document's source:
/// `<doc_name>` when stored as the parent side of a relation, `{ name,
/// parent }` when stored as a child in some other model's index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinField {
    Parent(String),
    Child { name: String, parent_id: String },
}

impl JoinField {
    fn to_value(&self) -> Value {
        match self {
            JoinField::Parent(name) => Value::String(name.clone()),
            JoinField::Child { name, parent_id } => json!({ "name": name, "parent": parent_id }),
        }
    }
}

/// Describes a parent relation exactly as needed to fan a write out to the
/// parent's index (a trimmed mirror of `es_model::ParentDescriptor`, kept
/// separate so this crate has no dependency on the model registry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentTarget {
    pub index: String,
    pub routing_attr: String,
}

/// Renders a single bulk action: header line and, except for `delete`, a
/// source line.
///
/// `routing` defaults to `id` at the call site when there is no parent
/// routing in play; this function always takes it explicitly so the two
/// cases (own-index write, parent-index write) share one code path.
fn action_line(
    op: WriteOp,
    index: &str,
    id: &str,
    routing: &str,
    doc_name: &str,
    join: Option<&JoinField>,
    payload: &Value,
) -> String {
    let header = json!({
        op.action_name(): { "_index": index, "_id": id, "routing": routing },
    });
    let mut rendered = header.to_string();
    match op {
        WriteOp::Delete => {},
        WriteOp::Create => {
            let mut source = payload.as_object().cloned().unwrap_or_default();
            source.insert("type".to_string(), Value::String(doc_name.to_string()));
            if let Some(join) = join {
                source.insert("join".to_string(), join.to_value());
            }
            rendered.push('\n');
            rendered.push_str(&Value::Object(source).to_string());
        },
        WriteOp::Update => {
            rendered.push('\n');
            rendered.push_str(&json!({ "doc": payload }).to_string());
        },
    }
    rendered
}

/// Builds the full multi-action bulk body for one document write, fanning
/// out to the document's own index and every parent whose routing attribute
/// is set on the document.
///
/// `payload` is the full document for `Create`, the changed-fields-only diff
/// for `Update`, and unused for `Delete`. `document` is always the full,
/// current document — it supplies the routing attribute values even when
/// `payload` is a partial diff, since a partial update can't be assumed to
/// carry its parent's id.
pub fn fan_out_write(
    doc_name: &str,
    own_index: &str,
    id: &str,
    has_children: bool,
    parents: &[ParentTarget],
    document: &Value,
    op: WriteOp,
    payload: &Value,
) -> Vec<String> {
    let mut actions = Vec::with_capacity(1 + parents.len());

    let own_join = has_children.then(|| JoinField::Parent(doc_name.to_string()));
    actions.push(action_line(op, own_index, id, id, doc_name, own_join.as_ref(), payload));

    for parent in parents {
        let Some(parent_id) = document.get(&parent.routing_attr).and_then(Value::as_str) else {
            continue;
        };
        if parent_id.is_empty() {
            continue;
        }
        let join =
            JoinField::Child { name: doc_name.to_string(), parent_id: parent_id.to_string() };
        actions.push(action_line(op, &parent.index, id, parent_id, doc_name, Some(&join), payload));
    }

    actions
}

/// Joins a set of already-rendered actions into one bulk body, terminated
/// with a trailing newline as the bulk endpoint requires.
pub fn wrap_bulk_body<I: IntoIterator<Item = String>>(actions: I) -> String {
    let mut body = String::new();
    for action in actions {
        body.push_str(&action);
        body.push('\n');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_action_has_header_and_source_lines() {
        let lines = fan_out_write(
            "Broke",
            "brokes",
            "B1",
            false,
            &[],
            &json!({ "id": "B1" }),
            WriteOp::Create,
            &json!({ "id": "B1", "breaks": "ankle" }),
        );
        assert_eq!(lines.len(), 1);
        let parts: Vec<&str> = lines[0].split('\n').collect();
        assert_eq!(parts.len(), 2);
        let header: Value = serde_json::from_str(parts[0]).unwrap();
        assert_eq!(header["create"]["_index"], "brokes");
        assert_eq!(header["create"]["_id"], "B1");
        assert_eq!(header["create"]["routing"], "B1");
        let source: Value = serde_json::from_str(parts[1]).unwrap();
        assert_eq!(source["type"], "Broke");
        assert_eq!(source["breaks"], "ankle");
        assert!(source.get("join").is_none());
    }

    #[test]
    fn delete_action_has_only_a_header_line() {
        let lines = fan_out_write(
            "Broke",
            "brokes",
            "B1",
            false,
            &[],
            &json!({ "id": "B1" }),
            WriteOp::Delete,
            &Value::Null,
        );
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].contains('\n'));
    }

    #[test]
    fn update_action_wraps_partial_in_doc() {
        let lines = fan_out_write(
            "Broke",
            "brokes",
            "B1",
            false,
            &[],
            &json!({ "id": "B1" }),
            WriteOp::Update,
            &json!({ "status": false }),
        );
        let parts: Vec<&str> = lines[0].split('\n').collect();
        let source: Value = serde_json::from_str(parts[1]).unwrap();
        assert_eq!(source, json!({ "doc": { "status": false } }));
    }

    #[test]
    fn scenario_fan_out_write() {
        // A Beverage::Coffee document routed to its Programmer parent.
        let document = json!({ "id": "C1", "programmer_id": "P1", "name": "drip" });
        let parents = vec![ParentTarget {
            index: "programmers".to_string(),
            routing_attr: "programmer_id".to_string(),
        }];
        let lines = fan_out_write(
            "Coffee",
            "coffees",
            "C1",
            false,
            &parents,
            &document,
            WriteOp::Create,
            &document,
        );
        assert_eq!(lines.len(), 2);

        let own: Vec<&str> = lines[0].split('\n').collect();
        let own_header: Value = serde_json::from_str(own[0]).unwrap();
        assert_eq!(own_header["create"]["_index"], "coffees");
        assert_eq!(own_header["create"]["routing"], "C1");
        let own_source: Value = serde_json::from_str(own[1]).unwrap();
        assert!(own_source.get("join").is_none());

        let parent: Vec<&str> = lines[1].split('\n').collect();
        let parent_header: Value = serde_json::from_str(parent[0]).unwrap();
        assert_eq!(parent_header["create"]["_index"], "programmers");
        assert_eq!(parent_header["create"]["_id"], "C1");
        assert_eq!(parent_header["create"]["routing"], "P1");
        let parent_source: Value = serde_json::from_str(parent[1]).unwrap();
        assert_eq!(parent_source["join"], json!({ "name": "Coffee", "parent": "P1" }));
    }

    #[test]
    fn parent_with_empty_routing_value_is_skipped() {
        let document = json!({ "id": "C1", "programmer_id": "" });
        let parents = vec![ParentTarget {
            index: "programmers".to_string(),
            routing_attr: "programmer_id".to_string(),
        }];
        let lines = fan_out_write(
            "Coffee",
            "coffees",
            "C1",
            false,
            &parents,
            &document,
            WriteOp::Create,
            &document,
        );
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn bulk_body_ends_with_a_trailing_newline() {
        let body = wrap_bulk_body(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(body, "a\nb\n");
        assert!(body.ends_with('\n'));
    }
}
