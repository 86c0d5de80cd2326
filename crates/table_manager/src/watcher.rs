//! One long-lived task per table, consuming a change-stream iterator and
//! emitting per-event bulk writes, supervised with retry and a stop channel.

use std::{
    sync::Arc,
    time::Duration,
};

use async_broadcast::Receiver;
use backoff::{
    future::retry,
    ExponentialBackoff,
};
use es_client::{
    fan_out_write,
    wrap_bulk_body,
    ParentTarget,
    SearchClient,
    WriteOp,
};
use es_model::{
    ManagedModel,
    ModelRegistry,
};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::{
    backfill,
    metrics,
    primary_store::{
        ChangeEvent,
        ChangeStream,
        EventKind,
        PrimaryStore,
    },
};

/// Base delay and per-episode ceiling for reconnect backoff.
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_ELAPSED: Duration = Duration::from_secs(15);

fn reconnect_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: INITIAL_BACKOFF,
        max_elapsed_time: Some(MAX_ELAPSED),
        ..Default::default()
    }
}

fn parent_targets(model: &ManagedModel) -> Vec<ParentTarget> {
    model
        .parents
        .iter()
        .map(|p| ParentTarget { index: p.index.clone(), routing_attr: p.routing_attr.clone() })
        .collect()
}

/// Spawns the watcher task for one model. Returns the task handle; the
/// caller does not need to await it — `stop` is how the watcher is told to
/// exit.
pub fn spawn_watcher(
    client: Arc<SearchClient>,
    registry: Arc<ModelRegistry>,
    store: Arc<dyn PrimaryStore>,
    document_name: String,
    stop_rx: Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(run(client, registry, store, document_name, stop_rx))
}

fn stop_requested(stop_rx: &mut Receiver<()>) -> bool {
    stop_rx.try_recv().is_ok()
}

async fn run(
    client: Arc<SearchClient>,
    registry: Arc<ModelRegistry>,
    store: Arc<dyn PrimaryStore>,
    document_name: String,
    mut stop_rx: Receiver<()>,
) {
    let model = registry
        .model(&document_name)
        .expect("watcher is only spawned for a managed model")
        .clone();
    let parents = parent_targets(&model);

    let mut first_attempt = true;
    loop {
        if stop_requested(&mut stop_rx) {
            tracing::info!(model = %document_name, "watcher stopping before reconnect");
            return;
        }

        if !first_attempt {
            tracing::info!(model = %document_name, "backfilling before resuming change stream");
            if let Err(error) = backfill::backfill(&client, &registry, &store, &document_name).await {
                tracing::error!(model = %document_name, %error, "backfill-on-reconnect failed");
            }
        }
        first_attempt = false;

        let table_name = model.table_name.clone();
        let store_for_retry = store.clone();
        let stream = retry(reconnect_backoff(), move || {
            let store = store_for_retry.clone();
            let table_name = table_name.clone();
            let document_name = document_name.clone();
            async move {
                metrics::record_watcher_reconnect(&document_name);
                store.watch(&table_name).await.map_err(backoff::Error::transient)
            }
        })
        .await;

        let mut stream = match stream {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(
                    model = %document_name,
                    %error,
                    "exhausted the reconnect window opening the change stream; terminating process",
                );
                std::process::exit(1);
            },
        };

        if !consume(&client, &model, &parents, stream.as_mut(), &mut stop_rx).await {
            stream.close().await;
            return;
        }
        stream.close().await;
    }
}

/// Reads events until the stream ends (returns `true`, triggering a
/// reconnect) or `stop` fires (returns `false`).
async fn consume(
    client: &Arc<SearchClient>,
    model: &ManagedModel,
    parents: &[ParentTarget],
    stream: &mut (dyn ChangeStream + '_),
    stop_rx: &mut Receiver<()>,
) -> bool {
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.recv() => {
                tracing::info!(model = %model.document_name, "watcher stop signal received");
                return false;
            },
            next = stream.next() => {
                match next {
                    None => return true,
                    Some(Err(error)) => {
                        tracing::warn!(model = %model.document_name, %error, "change stream error; reconnecting");
                        return true;
                    },
                    Some(Ok(event)) => {
                        spawn_apply(client.clone(), model.clone(), parents.to_vec(), event);
                    },
                }
            },
        }
    }
}

/// Applies one change event as a short-lived task, so a slow write cannot
/// stall the reading of the next event. Per-event failures are logged
/// and do not tear down the watcher.
fn spawn_apply(client: Arc<SearchClient>, model: ManagedModel, parents: Vec<ParentTarget>, event: ChangeEvent) {
    tokio::spawn(async move {
        let Some(document) = event.value else {
            // A pure tombstone: there's no document to resolve parent
            // routing from, so the write is skipped.
            return;
        };
        let Some(id) = document.get("id").and_then(Value::as_str).map(str::to_string) else {
            tracing::error!(model = %model.document_name, "change event document is missing an `id` field");
            return;
        };

        let op = match event.event {
            EventKind::Created => WriteOp::Create,
            EventKind::Updated => WriteOp::Update,
            EventKind::Deleted => WriteOp::Delete,
        };
        // Create/Delete write the full document; Update writes only the
        // changed fields, falling back to the full document if the store
        // didn't supply a diff.
        let payload = match (op, &event.changed_fields) {
            (WriteOp::Update, Some(diff)) => diff,
            _ => &document,
        };

        let actions = fan_out_write(
            &model.document_name,
            &model.table_name,
            &id,
            model.has_children(),
            &parents,
            &document,
            op,
            payload,
        );
        let body = wrap_bulk_body(actions);

        match client.bulk(body).await {
            Ok(()) => metrics::record_bulk_request("success"),
            Err(error) => {
                tracing::error!(model = %model.document_name, id, %error, "per-event bulk write failed");
                metrics::record_bulk_request("failure");
            },
        }
    });
}
