use thiserror::Error;

/// Errors raised while assembling a [`crate::ModelRegistry`] from
/// [`crate::ModelSpec`]s. All of these are fatal at construction time: the
/// registry is built once at process startup, so there is no later point at
/// which an inconsistent configuration could be safely tolerated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "document name {document_name:?} is claimed by both {first_table:?} and \
         {second_table:?}; document names must be unique across managed tables"
    )]
    DuplicateDocumentName {
        document_name: String,
        first_table: String,
        second_table: String,
    },

    #[error(
        "attribute {attribute:?} on {model:?} declares parent {parent:?}, which is not a \
         managed model"
    )]
    UnknownParent {
        model: String,
        attribute: String,
        parent: String,
    },

    #[error("parent relations form a cycle: {}", cycle.join(" -> "))]
    CyclicParents { cycle: Vec<String> },

    #[error(
        "property {property:?} is mapped as {parent_type:?} on {parent_model:?} but as \
         {child_type:?} by child {child_model:?}; field types must agree"
    )]
    PropertyTypeConflict {
        property: String,
        parent_model: String,
        parent_type: String,
        child_model: String,
        child_type: String,
    },

    #[error(
        "es_type override {tag:?} on {model:?}.{attribute:?} is not a recognized field type"
    )]
    InvalidFieldType { model: String, attribute: String, tag: String },
}
