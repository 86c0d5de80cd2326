use thiserror::Error;

/// Errors from the connection pool or the underlying transport itself,
/// independent of what the search cluster said.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("timed out after {0:?} waiting for a search-cluster connection pool permit")]
    PoolTimeout(std::time::Duration),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Raised by [`crate::SearchClient::put_mapping`].
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("PUT mapping for index {index:?} failed: HTTP {status}")]
    Failed { index: String, status: u16 },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Raised by [`crate::SearchClient::bulk`].
#[derive(Error, Debug)]
pub enum BulkError {
    #[error("bulk request failed: HTTP {status}: {body}")]
    Failed { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}
