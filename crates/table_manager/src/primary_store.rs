//! The primary store as consumed by the core: two capabilities —
//! iterating a table's full contents and opening a change stream for it.
//! The concrete driver is an external collaborator; this module only
//! defines the trait boundary plus an in-memory test double.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

/// A document as the primary store represents it: a JSON object expected to
/// carry an `id` field (the document's own id) and, for child models, a
/// routing attribute naming its parent's id.
pub type Document = Value;

/// Read consistency requested when streaming a full table (backfill
/// always reads at `Majority`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadConsistency {
    Majority,
}

/// The kind of change a `ChangeEvent` reports.
///
/// This enum is closed by construction: any wire representation the real
/// driver decodes into one of these three variants has already rejected
/// unknown tags before constructing a `ChangeEvent` — treating an unknown
/// event kind as a fatal programming error — so there is no variant here
/// left to match as "unknown".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

/// One entry from a change stream. `value` is the current document, `None`
/// for a pure tombstone — the watcher skips those, since a delete
/// can't be routed to a parent index without the document's routing
/// attribute values.
///
/// `changed_fields` lets the primary store's change stream supply a true
/// diff for `Updated` events, as a second field alongside the full
/// document — so an `Updated` write can honor "update source = only changed
/// fields" without the watcher having to diff documents itself. It
/// is `None` for `Created`/`Deleted` events, where the bulk write uses the
/// full document (or none, for delete).
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    pub event: EventKind,
    pub value: Option<Document>,
    pub changed_fields: Option<Value>,
}

/// An open change stream for one table. Exposed as a trait object (rather
/// than a plain `Stream`) so the watcher can call `close` explicitly on
/// `stop`, independent of simply dropping the value.
#[async_trait]
pub trait ChangeStream: Send {
    async fn next(&mut self) -> Option<anyhow::Result<ChangeEvent>>;

    async fn close(&mut self);
}

/// The two capabilities the core needs from the primary store.
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    async fn iterate_all(
        &self,
        table: &str,
        consistency: ReadConsistency,
    ) -> anyhow::Result<BoxStream<'static, anyhow::Result<Document>>>;

    async fn watch(&self, table: &str) -> anyhow::Result<Box<dyn ChangeStream>>;
}
