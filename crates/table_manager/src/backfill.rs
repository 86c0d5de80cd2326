//! Streams a table from the primary store and emits bulk writes in bounded
//! batches, fanned out in parallel across tables.

use std::{
    sync::Arc,
    time::Instant,
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
use futures::StreamExt;
use serde_json::Value;

use crate::{
    error::TableManagerError,
    metrics,
    primary_store::{
        PrimaryStore,
        ReadConsistency,
    },
};

/// Documents per bulk request.
pub const CHUNK_SIZE: usize = 100;

fn parent_targets(model: &ManagedModel) -> Vec<ParentTarget> {
    model
        .parents
        .iter()
        .map(|p| ParentTarget { index: p.index.clone(), routing_attr: p.routing_attr.clone() })
        .collect()
}

/// Fully repopulates one model's index (and its parents' join documents)
/// from the primary store. Failures of a single chunk are logged and
/// swallowed — other chunks proceed.
pub async fn backfill(
    client: &Arc<SearchClient>,
    registry: &Arc<ModelRegistry>,
    store: &Arc<dyn PrimaryStore>,
    document_name: &str,
) -> anyhow::Result<()> {
    let model = registry
        .model(document_name)
        .ok_or_else(|| TableManagerError::UnknownModel(document_name.to_string()))?
        .clone();

    let mut rows = store.iterate_all(&model.table_name, ReadConsistency::Majority).await?;
    let parents = parent_targets(&model);

    let mut chunk: Vec<Value> = Vec::with_capacity(CHUNK_SIZE);
    let mut tasks = Vec::new();
    while let Some(row) = rows.next().await {
        chunk.push(row?);
        if chunk.len() == CHUNK_SIZE {
            tasks.push(spawn_chunk(client.clone(), model.clone(), parents.clone(), std::mem::take(&mut chunk)));
        }
    }
    if !chunk.is_empty() {
        tasks.push(spawn_chunk(client.clone(), model.clone(), parents.clone(), chunk));
    }

    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

fn spawn_chunk(
    client: Arc<SearchClient>,
    model: ManagedModel,
    parents: Vec<ParentTarget>,
    chunk: Vec<Value>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let chunk_size = chunk.len();
        let started = Instant::now();

        let actions: Vec<String> = chunk
            .iter()
            .filter_map(|document| {
                let id = document.get("id").and_then(Value::as_str)?;
                Some(fan_out_write(
                    &model.document_name,
                    &model.table_name,
                    id,
                    model.has_children(),
                    &parents,
                    document,
                    WriteOp::Create,
                    document,
                ))
            })
            .flatten()
            .collect();

        let body = wrap_bulk_body(actions);
        metrics::observe_backfill_chunk_duration(&model.document_name, started.elapsed().as_secs_f64());

        if let Err(error) = client.bulk(body).await {
            tracing::error!(
                model = %model.document_name,
                chunk_size,
                %error,
                "backfill chunk failed; other chunks continue",
            );
            metrics::record_bulk_request("failure");
        } else {
            metrics::record_bulk_request("success");
        }
    })
}

/// Runs [`backfill`] for every managed model in parallel.
pub async fn backfill_all(
    client: &Arc<SearchClient>,
    registry: &Arc<ModelRegistry>,
    store: &Arc<dyn PrimaryStore>,
) -> anyhow::Result<()> {
    let tasks: Vec<_> = registry
        .models()
        .map(|model| {
            let client = client.clone();
            let registry = registry.clone();
            let store = store.clone();
            let document_name = model.document_name.clone();
            tokio::spawn(async move { backfill(&client, &registry, &store, &document_name).await })
        })
        .collect();

    for task in tasks {
        task.await.expect("backfill task panicked")?;
    }
    Ok(())
}
