use std::collections::{
    BTreeMap,
    BTreeSet,
};

use serde_json::Value;

use crate::{
    descriptor::ModelSpec,
    error::ConfigError,
    field_type,
    field_type::FieldType,
    schema::build_schema,
};

/// The document name, index, and routing attribute of one parent relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentDescriptor {
    pub name: String,
    pub index: String,
    pub routing_attr: String,
}

/// A fully resolved managed model: its own properties plus the parent and
/// child relationships discovered while building the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedModel {
    pub document_name: String,
    pub table_name: String,
    pub own_properties: BTreeMap<String, FieldType>,
    pub parents: Vec<ParentDescriptor>,
    /// Document names of models whose `parent` tag names this model, sorted.
    pub children: Vec<String>,
}

impl ManagedModel {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The static, process-lifetime map from model name to resolved metadata.
/// Built once via [`ModelRegistry::build`]; every index
/// schema is derived at the same time and cached for the life of the
/// process.
#[derive(Clone, Debug)]
pub struct ModelRegistry {
    models: BTreeMap<String, ManagedModel>,
    schemas: BTreeMap<String, Value>,
}

impl ModelRegistry {
    pub fn build(specs: Vec<ModelSpec>) -> Result<Self, ConfigError> {
        let mut table_names: BTreeMap<String, String> = BTreeMap::new();
        for spec in &specs {
            let doc_name = spec.document_name().to_string();
            if let Some(existing_table) = table_names.get(&doc_name) {
                return Err(ConfigError::DuplicateDocumentName {
                    document_name: doc_name,
                    first_table: existing_table.clone(),
                    second_table: spec.table_name.clone(),
                });
            }
            table_names.insert(doc_name, spec.table_name.clone());
        }

        let mut own_properties: BTreeMap<String, BTreeMap<String, FieldType>> = BTreeMap::new();
        let mut parents: BTreeMap<String, Vec<ParentDescriptor>> = BTreeMap::new();
        for spec in &specs {
            let doc_name = spec.document_name().to_string();
            let mut props = BTreeMap::new();
            let mut own_parents = Vec::new();
            for attr in &spec.attributes {
                match field_type::map(&attr.source_type, attr.tags.es_type.as_deref()) {
                    Ok(Some(ty)) => {
                        // The `id` attribute is always the document's own
                        // `_id` and a parent-routing target; it is kept
                        // exact-match (`keyword`) regardless of its
                        // declared source type unless an `es_type` override
                        // already chose something else.
                        let ty = if attr.name == "id" && attr.tags.es_type.is_none() {
                            FieldType::Keyword
                        } else {
                            ty
                        };
                        props.insert(attr.name.clone(), ty);
                    },
                    Ok(None) => {
                        tracing::warn!(
                            model = %doc_name,
                            attribute = %attr.name,
                            source_type = %attr.source_type,
                            "dropping attribute with unmappable source type",
                        );
                    },
                    Err(tag) => {
                        return Err(ConfigError::InvalidFieldType {
                            model: doc_name.clone(),
                            attribute: attr.name.clone(),
                            tag,
                        });
                    },
                }
                if let Some(parent_name) = &attr.tags.parent {
                    let Some(parent_index) = table_names.get(parent_name) else {
                        return Err(ConfigError::UnknownParent {
                            model: doc_name.clone(),
                            attribute: attr.name.clone(),
                            parent: parent_name.clone(),
                        });
                    };
                    own_parents.push(ParentDescriptor {
                        name: parent_name.clone(),
                        index: parent_index.clone(),
                        routing_attr: attr.name.clone(),
                    });
                }
            }
            own_properties.insert(doc_name.clone(), props);
            parents.insert(doc_name, own_parents);
        }

        detect_cycles(&parents)?;

        let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (child, parent_list) in &parents {
            for parent in parent_list {
                children.entry(parent.name.clone()).or_default().insert(child.clone());
            }
        }

        let mut models = BTreeMap::new();
        let mut schemas = BTreeMap::new();
        for spec in &specs {
            let doc_name = spec.document_name().to_string();
            let own = &own_properties[&doc_name];
            let child_names: Vec<String> =
                children.get(&doc_name).map(|s| s.iter().cloned().collect()).unwrap_or_default();

            let mut merged = own.clone();
            for child_name in &child_names {
                for (prop, ty) in &own_properties[child_name] {
                    match merged.get(prop) {
                        Some(existing) if existing != ty => {
                            return Err(ConfigError::PropertyTypeConflict {
                                property: prop.clone(),
                                parent_model: doc_name.clone(),
                                parent_type: existing.as_str().to_string(),
                                child_model: child_name.clone(),
                                child_type: ty.as_str().to_string(),
                            });
                        },
                        Some(_) => {},
                        None => {
                            merged.insert(prop.clone(), *ty);
                        },
                    }
                }
            }

            let schema = build_schema(&merged, &doc_name, &child_names);
            schemas.insert(doc_name.clone(), schema);

            models.insert(
                doc_name.clone(),
                ManagedModel {
                    document_name: doc_name.clone(),
                    table_name: spec.table_name.clone(),
                    own_properties: own.clone(),
                    parents: parents.remove(&doc_name).unwrap_or_default(),
                    children: child_names,
                },
            );
        }

        Ok(Self { models, schemas })
    }

    pub fn model(&self, document_name: &str) -> Option<&ManagedModel> {
        self.models.get(document_name)
    }

    pub fn models(&self) -> impl Iterator<Item = &ManagedModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn schema(&self, document_name: &str) -> Option<&Value> {
        self.schemas.get(document_name)
    }

    pub fn schema_string(&self, document_name: &str) -> Option<String> {
        self.schemas.get(document_name).map(|v| v.to_string())
    }
}

/// Parent relations must form a DAG; detect any cycle via
/// DFS with an explicit recursion-stack set.
fn detect_cycles(parents: &BTreeMap<String, Vec<ParentDescriptor>>) -> Result<(), ConfigError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        node: &str,
        parents: &BTreeMap<String, Vec<ParentDescriptor>>,
        marks: &mut BTreeMap<String, Mark>,
        stack: &mut Vec<String>,
    ) -> Result<(), ConfigError> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| n == node).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(node.to_string());
                return Err(ConfigError::CyclicParents { cycle });
            },
            None => {},
        }
        marks.insert(node.to_string(), Mark::Visiting);
        stack.push(node.to_string());
        if let Some(edges) = parents.get(node) {
            for parent in edges {
                visit(&parent.name, parents, marks, stack)?;
            }
        }
        stack.pop();
        marks.insert(node.to_string(), Mark::Done);
        Ok(())
    }

    let mut marks = BTreeMap::new();
    for node in parents.keys() {
        let mut stack = Vec::new();
        visit(node, parents, &mut marks, &mut stack)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        AttributeSpec,
        Tags,
    };

    fn attr(name: &str, source_type: &str) -> AttributeSpec {
        AttributeSpec::new(name, source_type, Tags::none())
    }

    #[test]
    fn scenario_schema_generation() {
        let specs = vec![ModelSpec::new(
            "Broke",
            "brokes",
            vec![
                attr("id", "string"),
                attr("breaks", "string"),
                attr("status", "bool"),
                attr("hasho", "map<string,string>"),
            ],
        )];
        let registry = ModelRegistry::build(specs).unwrap();
        let schema = registry.schema("Broke").unwrap();
        let props = &schema["mappings"]["properties"];
        assert_eq!(props["id"]["type"], "keyword");
        assert_eq!(props["breaks"]["type"], "text");
        assert_eq!(props["status"]["type"], "boolean");
        assert_eq!(props["hasho"]["type"], "object");
        assert_eq!(props["type"]["type"], "keyword");
        assert!(props.get("join").is_none());
    }

    #[test]
    fn id_attribute_is_always_keyword_regardless_of_source_type() {
        let specs = vec![ModelSpec::new(
            "Thing",
            "things",
            vec![AttributeSpec::new("id", "int64", Tags::none())],
        )];
        let registry = ModelRegistry::build(specs).unwrap();
        let schema = registry.schema("Thing").unwrap();
        assert_eq!(schema["mappings"]["properties"]["id"]["type"], "keyword");
    }

    #[test]
    fn es_type_override_on_id_still_wins() {
        let specs = vec![ModelSpec::new(
            "Thing",
            "things",
            vec![AttributeSpec::new("id", "string", Tags::es_type("long"))],
        )];
        let registry = ModelRegistry::build(specs).unwrap();
        let schema = registry.schema("Thing").unwrap();
        assert_eq!(schema["mappings"]["properties"]["id"]["type"], "long");
    }

    #[test]
    fn scenario_parent_relation_discovery() {
        let specs = vec![
            ModelSpec::new("Programmer", "programmers", vec![attr("id", "string")]),
            ModelSpec::new(
                "Migraine",
                "migraines",
                vec![
                    attr("id", "string"),
                    AttributeSpec::new("programmer_id", "string", Tags::parent("Programmer")),
                ],
            ),
        ];
        let registry = ModelRegistry::build(specs).unwrap();
        let migraine = registry.model("Migraine").unwrap();
        assert_eq!(
            migraine.parents,
            vec![ParentDescriptor {
                name: "Programmer".to_string(),
                index: "programmers".to_string(),
                routing_attr: "programmer_id".to_string(),
            }]
        );
        let programmer = registry.model("Programmer").unwrap();
        assert_eq!(programmer.children, vec!["Migraine".to_string()]);
    }

    #[test]
    fn duplicate_document_names_are_rejected() {
        let specs = vec![
            ModelSpec::new("a::Thing", "things_a", vec![attr("id", "string")]),
            ModelSpec::new("b::Thing", "things_b", vec![attr("id", "string")]),
        ];
        assert!(matches!(
            ModelRegistry::build(specs),
            Err(ConfigError::DuplicateDocumentName { .. })
        ));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let specs = vec![ModelSpec::new(
            "Migraine",
            "migraines",
            vec![AttributeSpec::new("programmer_id", "string", Tags::parent("Ghost"))],
        )];
        assert!(matches!(ModelRegistry::build(specs), Err(ConfigError::UnknownParent { .. })));
    }

    #[test]
    fn cyclic_parents_are_rejected() {
        let specs = vec![
            ModelSpec::new(
                "A",
                "as",
                vec![AttributeSpec::new("b_id", "string", Tags::parent("B"))],
            ),
            ModelSpec::new(
                "B",
                "bs",
                vec![AttributeSpec::new("a_id", "string", Tags::parent("A"))],
            ),
        ];
        assert!(matches!(ModelRegistry::build(specs), Err(ConfigError::CyclicParents { .. })));
    }

    #[test]
    fn conflicting_property_types_between_parent_and_child_are_rejected() {
        let specs = vec![
            ModelSpec::new("Programmer", "programmers", vec![attr("name", "string")]),
            ModelSpec::new(
                "Migraine",
                "migraines",
                vec![
                    attr("name", "int64"),
                    AttributeSpec::new("programmer_id", "string", Tags::parent("Programmer")),
                ],
            ),
        ];
        assert!(matches!(
            ModelRegistry::build(specs),
            Err(ConfigError::PropertyTypeConflict { .. })
        ));
    }

    #[test]
    fn join_relations_are_sorted_and_deterministic() {
        let specs = vec![
            ModelSpec::new("Parent", "parents", vec![attr("id", "string")]),
            ModelSpec::new(
                "Zebra",
                "zebras",
                vec![AttributeSpec::new("parent_id", "string", Tags::parent("Parent"))],
            ),
            ModelSpec::new(
                "Apple",
                "apples",
                vec![AttributeSpec::new("parent_id", "string", Tags::parent("Parent"))],
            ),
        ];
        let registry = ModelRegistry::build(specs).unwrap();
        let schema = registry.schema("Parent").unwrap();
        assert_eq!(
            schema["mappings"]["properties"]["join"]["relations"]["Parent"],
            serde_json::json!(["Apple", "Zebra"]),
        );
    }
}
