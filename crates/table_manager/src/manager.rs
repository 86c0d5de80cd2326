//! The table manager facade: holds the model registry, the search client,
//! and the primary store; orchestrates startup and exposes the operational
//! surface.

use std::sync::{
    atomic::{
        AtomicBool,
        Ordering,
    },
    Arc,
};

use async_broadcast::{
    broadcast,
    Receiver,
    Sender,
};
use es_client::SearchClient;
use es_model::ModelRegistry;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::{
    backfill,
    primary_store::PrimaryStore,
    reconciler,
    watcher,
};

pub struct TableManager {
    registry: Arc<ModelRegistry>,
    client: Arc<SearchClient>,
    store: Arc<dyn PrimaryStore>,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    watcher_handles: Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl TableManager {
    /// Construction performs, in order: reconcile, optional `backfill_all`,
    /// optional `watch_tables` — one task spawned per model.
    pub async fn start(
        registry: Arc<ModelRegistry>,
        client: Arc<SearchClient>,
        store: Arc<dyn PrimaryStore>,
        backfill: bool,
        watch: bool,
    ) -> anyhow::Result<Arc<Self>> {
        let (stop_tx, stop_rx) = broadcast(1);
        let manager = Arc::new(Self {
            registry,
            client,
            store,
            stop_tx,
            stop_rx,
            watcher_handles: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
        });

        reconciler::reconcile(&manager.client, &manager.registry).await?;
        if backfill {
            manager.backfill_all().await?;
        }
        if watch {
            manager.watch_tables();
        }
        Ok(manager)
    }

    fn watch_tables(&self) {
        let mut handles = self.watcher_handles.lock();
        for model in self.registry.models() {
            handles.push(watcher::spawn_watcher(
                self.client.clone(),
                self.registry.clone(),
                self.store.clone(),
                model.document_name.clone(),
                self.stop_rx.clone(),
            ));
        }
    }

    pub async fn reindex_all(&self) -> anyhow::Result<()> {
        reconciler::reindex_all(&self.client, &self.registry).await
    }

    pub async fn backfill_all(&self) -> anyhow::Result<()> {
        backfill::backfill_all(&self.client, &self.registry, &self.store).await
    }

    pub async fn backfill(&self, document_name: &str) -> anyhow::Result<()> {
        backfill::backfill(&self.client, &self.registry, &self.store, document_name).await
    }

    pub async fn reindex(&self, document_name: &str) -> anyhow::Result<()> {
        reconciler::reindex_model(&self.client, &self.registry, document_name).await
    }

    /// Closes the stop signal. Idempotent and safe to call from any task.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.stop_tx.try_broadcast(());
    }
}
