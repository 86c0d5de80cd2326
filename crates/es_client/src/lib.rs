//! The search-cluster client: request shaping, bulk-API framing, routing
//! policy, and connection pooling — component D of the table manager.

mod bulk;
mod client;
mod equivalence;
mod error;
mod pool;

pub use bulk::{
    fan_out_write,
    wrap_bulk_body,
    JoinField,
    ParentTarget,
    WriteOp,
};
pub use client::SearchClient;
pub use equivalence::equivalent;
pub use error::{
    BulkError,
    MappingError,
    TransportError,
};
pub use pool::{
    ConnectionPool,
    PoolConfig,
    PooledConnection,
};
