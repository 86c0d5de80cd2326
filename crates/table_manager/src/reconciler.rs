//! Compares derived mappings against what the search cluster actually has
//! and repairs drift.

use std::sync::Arc;

use es_client::SearchClient;
use es_model::ModelRegistry;
use tracing::instrument;

use crate::metrics;

/// For each managed model, checks whether its index exists and whether its
/// live mapping is equivalent to the derived one. If any model is missing
/// or drifted, every managed index is destructively recreated — a partial
/// reconciliation would leave dangling child documents in parent indices
/// whose schemas have diverged.
#[instrument(skip(client, registry))]
pub async fn reconcile(client: &Arc<SearchClient>, registry: &Arc<ModelRegistry>) -> anyhow::Result<bool> {
    let mut needs_reindex = false;
    for model in registry.models() {
        let drifted = match client.exists(&model.table_name).await? {
            false => true,
            true => {
                let live = client.get_mapping(&model.table_name).await?;
                let derived = registry
                    .schema(&model.document_name)
                    .expect("every managed model has a derived schema");
                let derived_mappings = &derived["mappings"];
                !es_client::equivalent(live.as_ref(), derived_mappings)
            },
        };
        if drifted {
            tracing::info!(model = %model.document_name, "mapping drift detected");
            needs_reindex = true;
        }
    }

    if needs_reindex {
        reindex_all(client, registry).await?;
        metrics::record_reconcile_run("reindexed");
    } else {
        metrics::record_reconcile_run("no_op");
    }
    Ok(needs_reindex)
}

/// Deletes and recreates every managed index with its derived schema, one
/// task per model, joined.
pub async fn reindex_all(client: &Arc<SearchClient>, registry: &Arc<ModelRegistry>) -> anyhow::Result<()> {
    let tasks: Vec<_> = registry
        .models()
        .map(|model| {
            let table_name = model.table_name.clone();
            let document_name = model.document_name.clone();
            let client = client.clone();
            let registry = registry.clone();
            tokio::spawn(async move {
                let schema = registry
                    .schema(&document_name)
                    .expect("every managed model has a derived schema")
                    .clone();
                reindex_one(&client, &table_name, &schema).await
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("reindex task panicked")?;
    }
    Ok(())
}

/// Deletes and re-applies the mapping for a single model (`TableManager::reindex`).
pub async fn reindex_model(client: &SearchClient, registry: &ModelRegistry, document_name: &str) -> anyhow::Result<()> {
    let model = registry
        .model(document_name)
        .ok_or_else(|| crate::error::TableManagerError::UnknownModel(document_name.to_string()))?;
    let schema =
        registry.schema(document_name).expect("every managed model has a derived schema").clone();
    reindex_one(client, &model.table_name, &schema).await
}

async fn reindex_one(client: &SearchClient, table_name: &str, schema: &serde_json::Value) -> anyhow::Result<()> {
    client.delete(table_name).await?;
    client.put_mapping(table_name, schema).await?;
    Ok(())
}
