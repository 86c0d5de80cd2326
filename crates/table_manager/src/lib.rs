//! Keeps a search cluster synchronized with a primary document database:
//! mapping reconciliation, backfill, and live change-stream watching behind
//! a single facade, [`TableManager`].

mod backfill;
mod error;
mod in_memory_store;
mod manager;
mod metrics;
mod primary_store;
mod reconciler;
mod watcher;

pub use error::TableManagerError;
pub use in_memory_store::{
    InMemoryChangeStream,
    InMemoryStore,
};
pub use manager::TableManager;
pub use primary_store::{
    ChangeEvent,
    ChangeStream,
    Document,
    EventKind,
    PrimaryStore,
    ReadConsistency,
};
