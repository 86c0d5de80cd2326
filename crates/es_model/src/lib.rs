//! Model registry, source-type-to-field-type mapping, and search index
//! schema derivation — components A, B, and C of the table manager.

mod descriptor;
mod error;
mod field_type;
mod registry;
mod schema;

pub use descriptor::{
    AttributeSpec,
    ModelSpec,
    Tags,
};
pub use error::ConfigError;
pub use field_type::FieldType;
pub use registry::{
    ManagedModel,
    ModelRegistry,
    ParentDescriptor,
};
pub use schema::{
    build_schema,
    fixed_settings,
    relations_value,
};
