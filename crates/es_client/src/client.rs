//! The pooled search-cluster HTTP client.

use reqwest::Url;
use serde_json::{
    json,
    Value,
};

use crate::{
    error::{
        BulkError,
        MappingError,
        TransportError,
    },
    pool::{
        ConnectionPool,
        PoolConfig,
    },
};

pub struct SearchClient {
    base_url: Url,
    pool: ConnectionPool,
}

impl SearchClient {
    pub fn new(base_url: Url, pool_config: PoolConfig) -> Self {
        Self { base_url, pool: ConnectionPool::new(pool_config) }
    }

    fn index_url(&self, index: &str) -> Url {
        self.base_url.join(&format!("{index}/")).expect("index name is a valid URL path segment")
    }

    /// `HEAD /{index}`.
    pub async fn exists(&self, index: &str) -> Result<bool, TransportError> {
        let conn = self.pool.checkout().await?;
        let response = conn.client().head(self.index_url(index)).send().await?;
        Ok(response.status().is_success())
    }

    /// `DELETE /{index}`.
    pub async fn delete(&self, index: &str) -> Result<bool, TransportError> {
        let conn = self.pool.checkout().await?;
        let response = conn.client().delete(self.index_url(index)).send().await?;
        Ok(response.status().is_success())
    }

    /// `GET /{index}`, returning the `mappings` subobject on any 2xx and
    /// `None` otherwise.
    pub async fn get_mapping(&self, index: &str) -> Result<Option<Value>, TransportError> {
        let conn = self.pool.checkout().await?;
        let response = conn.client().get(self.index_url(index)).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body: Value = response.json().await?;
        Ok(body.get(index).and_then(|index_body| index_body.get("mappings")).cloned())
    }

    /// `PUT /{index}` with the full schema (settings + mappings).
    pub async fn put_mapping(&self, index: &str, schema: &Value) -> Result<(), MappingError> {
        let conn = self.pool.checkout().await.map_err(TransportError::from)?;
        let response = conn
            .client()
            .put(self.index_url(index))
            .json(schema)
            .send()
            .await
            .map_err(TransportError::from)?;
        if !response.status().is_success() {
            return Err(MappingError::Failed { index: index.to_string(), status: response.status().as_u16() });
        }
        Ok(())
    }

    /// `POST /_bulk`. `body` must end with `\n`; callers build it
    /// with [`crate::bulk::wrap_bulk_body`].
    pub async fn bulk(&self, body: String) -> Result<(), BulkError> {
        debug_assert!(body.ends_with('\n'), "bulk body must end with a newline");
        let conn = self.pool.checkout().await.map_err(TransportError::from)?;
        let url = self.base_url.join("_bulk").expect("valid URL");
        let response = conn
            .client()
            .post(url)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(TransportError::from)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BulkError::Failed { status: status.as_u16(), body: text });
        }
        Ok(())
    }

    /// `POST /{indices|_all}/_delete_by_query` with a match-all query
    /// `indices = None` targets `_all`.
    pub async fn empty(&self, indices: Option<&[String]>) -> Result<bool, TransportError> {
        let path = match indices {
            Some(indices) if !indices.is_empty() => indices.join(","),
            _ => "_all".to_string(),
        };
        let conn = self.pool.checkout().await?;
        let url = self
            .base_url
            .join(&format!("{path}/_delete_by_query"))
            .expect("index list joins into a valid URL path");
        let response = conn
            .client()
            .post(url)
            .json(&json!({ "query": { "match_all": {} } }))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}
