/// Tags attached to a single attribute.
///
/// `es_type` overrides the derived field type outright; `parent` marks the
/// attribute as the routing key into another managed model's index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tags {
    pub es_type: Option<String>,
    pub parent: Option<String>,
}

impl Tags {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn es_type(type_name: impl Into<String>) -> Self {
        Self { es_type: Some(type_name.into()), parent: None }
    }

    pub fn parent(document_name: impl Into<String>) -> Self {
        Self { es_type: None, parent: Some(document_name.into()) }
    }
}

/// One attribute of a [`ModelSpec`]: its name, the type name as reported by
/// the primary store's model layer, and any tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: String,
    pub source_type: String,
    pub tags: Tags,
}

impl AttributeSpec {
    pub fn new(
        name: impl Into<String>,
        source_type: impl Into<String>,
        tags: Tags,
    ) -> Self {
        Self { name: name.into(), source_type: source_type.into(), tags }
    }
}

/// A managed model as supplied to [`crate::ModelRegistry::build`]: the raw
/// configuration, before relationships have been resolved or properties
/// derived.
///
/// `fully_qualified_name` mirrors the source model layer's namespaced name
/// (e.g. `myapp::models::Programmer`); only its last `::`-separated segment
/// — the [document name][Self::document_name] — is meaningful to the rest of
/// the system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub fully_qualified_name: String,
    pub table_name: String,
    pub attributes: Vec<AttributeSpec>,
}

impl ModelSpec {
    pub fn new(
        fully_qualified_name: impl Into<String>,
        table_name: impl Into<String>,
        attributes: Vec<AttributeSpec>,
    ) -> Self {
        Self {
            fully_qualified_name: fully_qualified_name.into(),
            table_name: table_name.into(),
            attributes,
        }
    }

    /// The last `::`-separated segment of the fully-qualified name: the
    /// polymorphism discriminator and the name used in `join` relations.
    pub fn document_name(&self) -> &str {
        self.fully_qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.fully_qualified_name)
    }
}
