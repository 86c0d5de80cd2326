use thiserror::Error;

/// Errors surfaced by the process bootstrap itself; everything from the
/// core (`es_model::ConfigError`, mapping/bulk/transport errors) propagates
/// through `anyhow::Result` at this boundary (call sites
/// that only need to report, not match on, an error use `anyhow`).
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("failed to bind control surface to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
