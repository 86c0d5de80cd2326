//! Process bootstrap: initialize logging, parse configuration, build
//! the model registry, construct the table manager (which reconciles
//! synchronously as part of construction), serve the control surface, and
//! wait on a signal for graceful shutdown.
//!
//! Deliberately without Sentry, a deterministic-simulation `Runtime` trait,
//! or a dev-site proxy — none of those have any bearing here.

mod demo_models;

use std::sync::Arc;

use clap::Parser;
use es_client::{
    PoolConfig,
    SearchClient,
};
use es_model::ModelRegistry;
use search_sync::{
    error::BootstrapError,
    router,
    Config,
};
use table_manager::{
    InMemoryStore,
    PrimaryStore,
    TableManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| tracing_subscriber::EnvFilter::new("info"),
        ))
        .init();

    let config = Config::parse();
    tracing::info!(?config, "starting search_sync");

    let registry = Arc::new(ModelRegistry::build(demo_models::managed_models())?);
    let base_url = config.es_base_url()?;
    let pool_config: PoolConfig = config.pool_config(registry.len());
    let client = Arc::new(SearchClient::new(base_url, pool_config));
    let store: Arc<dyn PrimaryStore> = Arc::new(InMemoryStore::new());

    let manager =
        TableManager::start(registry, client, store, config.backfill, config.watch).await?;

    let app = router(manager.clone());
    let listener =
        tokio::net::TcpListener::bind(&config.bind_addr).await.map_err(|source| {
            BootstrapError::Bind { addr: config.bind_addr.clone(), source }
        })?;
    tracing::info!(addr = %config.bind_addr, "control surface listening");

    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    serve.await?;

    manager.stop();
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received Ctrl-C, shutting down");
}
