//! Environment-driven configuration: a `clap::Parser` struct with
//! `#[arg(env = "...")]` fields and defaults, deliberately without any
//! instance-secret/key-broker concerns — nothing here needs them.

use std::time::Duration;

use clap::Parser;
use es_client::PoolConfig;
use url::Url;

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = "Keeps a search cluster synchronized with a primary store")]
pub struct Config {
    /// Full search-cluster URI. Takes precedence over `--es-host`/`--es-port`.
    #[arg(long, env = "ES_URI")]
    pub es_uri: Option<Url>,

    #[arg(long, env = "ES_HOST", default_value = "localhost")]
    pub es_host: String,

    #[arg(long, env = "ES_PORT", default_value_t = 9200)]
    pub es_port: u16,

    #[arg(long, env = "ES_TLS", default_value_t = false)]
    pub es_tls: bool,

    /// Defaults to the number of managed tables once the registry is known
    /// `None` here means "not overridden".
    #[arg(long, env = "ES_CONN_POOL")]
    pub es_conn_pool: Option<usize>,

    /// Defaults to a quarter of `es_conn_pool` once resolved.
    #[arg(long, env = "ES_IDLE_POOL")]
    pub es_idle_pool: Option<usize>,

    #[arg(long, env = "ES_CONN_POOL_TIMEOUT", default_value_t = 5.0)]
    pub es_conn_pool_timeout: f64,

    /// Run a full backfill at startup, after reconciliation.
    #[arg(long, env = "BACKFILL", default_value_t = true)]
    pub backfill: bool,

    /// Spawn per-table watchers at startup.
    #[arg(long, env = "WATCH", default_value_t = true)]
    pub watch: bool,

    /// Address the control surface binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,
}

impl Config {
    /// Resolves `ES_URI`/`ES_HOST`+`ES_PORT`/`ES_TLS` into the base URL the
    /// search client talks to.
    pub fn es_base_url(&self) -> anyhow::Result<Url> {
        if let Some(uri) = &self.es_uri {
            return Ok(ensure_trailing_slash(uri.clone()));
        }
        let scheme = if self.es_tls { "https" } else { "http" };
        let url = Url::parse(&format!("{scheme}://{}:{}/", self.es_host, self.es_port))?;
        Ok(url)
    }

    /// Resolves the connection pool configuration once the number of
    /// managed tables is known: `ES_CONN_POOL` defaults to that
    /// count, `ES_IDLE_POOL` to a quarter of whatever pool size results.
    pub fn pool_config(&self, managed_tables: usize) -> PoolConfig {
        let max_size = self.es_conn_pool.unwrap_or(managed_tables).max(1);
        let idle_size = self.es_idle_pool.unwrap_or_else(|| (max_size / 4).max(1)).max(1);
        PoolConfig {
            initial_size: idle_size,
            max_size,
            idle_size,
            checkout_timeout: Duration::from_secs_f64(self.es_conn_pool_timeout),
        }
    }
}

fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es_uri_takes_precedence() {
        let config = Config::parse_from([
            "search_sync",
            "--es-uri",
            "http://cluster:9999",
            "--es-host",
            "ignored",
        ]);
        assert_eq!(config.es_base_url().unwrap().as_str(), "http://cluster:9999/");
    }

    #[test]
    fn host_and_port_build_the_default_scheme() {
        let config = Config::parse_from(["search_sync", "--es-host", "example", "--es-port", "9201"]);
        assert_eq!(config.es_base_url().unwrap().as_str(), "http://example:9201/");
    }

    #[test]
    fn tls_flag_selects_https() {
        let config = Config::parse_from(["search_sync", "--es-tls", "true"]);
        assert_eq!(config.es_base_url().unwrap().scheme(), "https");
    }

    #[test]
    fn pool_defaults_from_managed_table_count() {
        let config = Config::parse_from(["search_sync"]);
        let pool = config.pool_config(8);
        assert_eq!(pool.max_size, 8);
        assert_eq!(pool.idle_size, 2);
    }

    #[test]
    fn explicit_pool_overrides_are_honored() {
        let config =
            Config::parse_from(["search_sync", "--es-conn-pool", "20", "--es-idle-pool", "3"]);
        let pool = config.pool_config(8);
        assert_eq!(pool.max_size, 20);
        assert_eq!(pool.idle_size, 3);
    }
}
