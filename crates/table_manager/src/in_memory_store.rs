//! An in-memory [`PrimaryStore`] backing the test suite and the demo
//! binary. Not part of the managed-table domain model — this is a test
//! double for an external collaborator, not a second implementation of it.

use std::collections::BTreeMap;

use async_broadcast::{
    broadcast,
    Receiver,
    Sender,
};
use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use serde_json::Value;

use crate::primary_store::{
    ChangeEvent,
    ChangeStream,
    Document,
    EventKind,
    PrimaryStore,
    ReadConsistency,
};

const CHANGE_STREAM_CAPACITY: usize = 1024;

struct Table {
    rows: BTreeMap<String, Document>,
    sender: Sender<ChangeEvent>,
    // Keeps the channel open even with no current subscriber; dropped
    // receivers would otherwise close the broadcast.
    _idle_receiver: Receiver<ChangeEvent>,
}

impl Table {
    fn new() -> Self {
        let (mut sender, receiver) = broadcast(CHANGE_STREAM_CAPACITY);
        sender.set_overflow(true);
        Self { rows: BTreeMap::new(), sender, _idle_receiver: receiver }
    }
}

/// A process-local stand-in for the primary store, keyed by table name.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<BTreeMap<String, Table>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_of(document: &Document) -> String {
        document
            .get("id")
            .and_then(Value::as_str)
            .expect("documents inserted into InMemoryStore must carry a string `id` field")
            .to_string()
    }

    /// Inserts (or overwrites) a row and broadcasts a `Created` event.
    pub fn insert(&self, table: &str, document: Document) {
        let id = Self::id_of(&document);
        let mut tables = self.tables.lock();
        let entry = tables.entry(table.to_string()).or_insert_with(Table::new);
        entry.rows.insert(id, document.clone());
        let _ = entry.sender.try_broadcast(ChangeEvent {
            event: EventKind::Created,
            value: Some(document),
            changed_fields: None,
        });
    }

    /// Merges `diff` into the existing row and broadcasts an `Updated`
    /// event carrying both the full, merged document and `diff` itself as
    /// `changed_fields` — a true diff alongside the current document.
    pub fn update(&self, table: &str, id: &str, diff: Value) {
        let mut tables = self.tables.lock();
        let Some(entry) = tables.get_mut(table) else { return };
        let Some(row) = entry.rows.get_mut(id) else { return };
        if let (Value::Object(row_obj), Value::Object(diff_obj)) = (row, diff.clone()) {
            for (k, v) in diff_obj {
                row_obj.insert(k, v);
            }
        }
        let merged = entry.rows.get(id).cloned();
        let _ = entry.sender.try_broadcast(ChangeEvent {
            event: EventKind::Updated,
            value: merged,
            changed_fields: Some(diff),
        });
    }

    /// Removes a row and broadcasts a `Deleted` event carrying the document
    /// as it was right before deletion (so fan-out can still resolve parent
    /// routing for the delete).
    pub fn delete(&self, table: &str, id: &str) {
        let mut tables = self.tables.lock();
        let Some(entry) = tables.get_mut(table) else { return };
        let removed = entry.rows.remove(id);
        let _ = entry.sender.try_broadcast(ChangeEvent {
            event: EventKind::Deleted,
            value: removed,
            changed_fields: None,
        });
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map(|t| t.rows.len()).unwrap_or(0)
    }
}

pub struct InMemoryChangeStream {
    receiver: Receiver<ChangeEvent>,
}

#[async_trait]
impl ChangeStream for InMemoryChangeStream {
    async fn next(&mut self) -> Option<anyhow::Result<ChangeEvent>> {
        match self.receiver.recv().await {
            Ok(event) => Some(Ok(event)),
            Err(_) => None,
        }
    }

    async fn close(&mut self) {}
}

#[async_trait]
impl PrimaryStore for InMemoryStore {
    async fn iterate_all(
        &self,
        table: &str,
        _consistency: ReadConsistency,
    ) -> anyhow::Result<futures::stream::BoxStream<'static, anyhow::Result<Document>>> {
        let rows: Vec<Document> =
            self.tables.lock().get(table).map(|t| t.rows.values().cloned().collect()).unwrap_or_default();
        Ok(Box::pin(stream::iter(rows.into_iter().map(Ok))))
    }

    async fn watch(&self, table: &str) -> anyhow::Result<Box<dyn ChangeStream>> {
        let mut tables = self.tables.lock();
        let entry = tables.entry(table.to_string()).or_insert_with(Table::new);
        Ok(Box::new(InMemoryChangeStream { receiver: entry._idle_receiver.clone() }))
    }
}
