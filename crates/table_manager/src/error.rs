use thiserror::Error;

/// Errors the table manager surfaces to its caller. Configuration errors
/// (`es_model::ConfigError`) and the search client's own error types
/// propagate through `anyhow::Result` at the call sites that only need to
/// report, not match on, them.
#[derive(Error, Debug)]
pub enum TableManagerError {
    #[error("no managed model named {0:?}")]
    UnknownModel(String),
}
