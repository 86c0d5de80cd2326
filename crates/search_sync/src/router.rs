//! The HTTP control surface: a `Router<Arc<State>>` built from an `Arc`
//! of shared application state.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        Path,
        State,
    },
    http::StatusCode,
    routing::{
        get,
        post,
    },
    Json,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use table_manager::TableManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TableManager>,
}

pub fn router(manager: Arc<TableManager>) -> Router {
    Router::new()
        .route("/reindex", post(reindex))
        .route("/backfill", post(backfill))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/reindex/{table}", post(reindex_one_reserved))
        .route("/backfill/{table}", post(backfill_one_reserved))
        .with_state(AppState { manager })
}

#[derive(Deserialize)]
struct ReindexBody {
    #[serde(default = "default_true")]
    backfill: bool,
}

fn default_true() -> bool {
    true
}

/// `POST /reindex` → `reindex_all()`, then `backfill_all()` unless the
/// request body says `{"backfill": false}`. The body is
/// optional — an empty or absent body defaults `backfill` to `true`, same
/// as an explicit `{}`.
async fn reindex(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    let backfill = if body.is_empty() {
        true
    } else {
        serde_json::from_slice::<ReindexBody>(&body).map_err(internal_error)?.backfill
    };
    state.manager.reindex_all().await.map_err(internal_error)?;
    if backfill {
        state.manager.backfill_all().await.map_err(internal_error)?;
    }
    Ok(StatusCode::OK)
}

/// `POST /backfill` → `backfill_all()`.
async fn backfill(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    state.manager.backfill_all().await.map_err(internal_error)?;
    Ok(StatusCode::OK)
}

/// `GET /healthz` → `200 OK`.
async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /metrics` → Prometheus text exposition.
async fn metrics() -> Result<String, (StatusCode, String)> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer).map_err(internal_error)?;
    String::from_utf8(buffer).map_err(internal_error)
}

/// Per-table variants are reserved: always `501`.
async fn reindex_one_reserved(Path(_table): Path<String>) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_IMPLEMENTED, Json(json!({ "error": "per-table reindex is reserved" })))
}

async fn backfill_one_reserved(Path(_table): Path<String>) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_IMPLEMENTED, Json(json!({ "error": "per-table backfill is reserved" })))
}

fn internal_error(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_returns_200() {
        assert_eq!(healthz().await, StatusCode::OK);
    }

    #[test]
    fn reindex_body_defaults_backfill_to_true() {
        let body: ReindexBody = serde_json::from_str("{}").unwrap();
        assert!(body.backfill);
        let body: ReindexBody = serde_json::from_str(r#"{"backfill": false}"#).unwrap();
        assert!(!body.backfill);
    }

    #[tokio::test]
    async fn reserved_per_table_routes_return_501() {
        let (status, _) = reindex_one_reserved(Path("Programmer".to_string())).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        let (status, _) = backfill_one_reserved(Path("Programmer".to_string())).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }
}
