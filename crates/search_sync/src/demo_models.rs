//! A small, hard-coded set of [`ModelSpec`]s standing in for the
//! authoritative model layer: a single struct-of-descriptors built at
//! startup from configuration. A real
//! deployment replaces this module with a registry sourced from its own
//! primary-store driver; everything downstream of [`es_model::ModelRegistry`]
//! is unaware of where the specs came from.

use es_model::{
    AttributeSpec,
    ModelSpec,
    Tags,
};

pub fn managed_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new(
            "Programmer",
            "programmers",
            vec![
                AttributeSpec::new("id", "string", Tags::none()),
                AttributeSpec::new("name", "string", Tags::none()),
                AttributeSpec::new("bio", "string", Tags::es_type("text")),
            ],
        ),
        ModelSpec::new(
            "Migraine",
            "migraines",
            vec![
                AttributeSpec::new("id", "string", Tags::none()),
                AttributeSpec::new("severity", "int64", Tags::none()),
                AttributeSpec::new("programmer_id", "string", Tags::parent("Programmer")),
            ],
        ),
        ModelSpec::new(
            "Beverage::Coffee",
            "coffees",
            vec![
                AttributeSpec::new("id", "string", Tags::none()),
                AttributeSpec::new("roast", "string", Tags::none()),
                AttributeSpec::new("programmer_id", "string", Tags::parent("Programmer")),
            ],
        ),
    ]
}
