//! A checkout/release connection pool for the search cluster, in the shape
//! of a semaphore-bounded Postgres connection pool: a semaphore bounds the number of
//! connections concurrently checked out at `max_size`, an idle queue holds
//! handles below `idle_size`, and a background task periodically trims idle
//! handles back down. Unlike the Postgres pool, the transport here is HTTP
//! via `reqwest::Client`, which already multiplexes connections per host
//! internally — so a "pooled connection" is a lightweight handle carrying a
//! cloned client plus bookkeeping, and the semaphore is what actually bounds
//! concurrency.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Weak,
    },
    time::Duration,
};

use tokio::{
    sync::{
        Mutex as AsyncMutex,
        OwnedSemaphorePermit,
        Semaphore,
    },
    time::Instant,
};

use crate::error::TransportError;

/// How long an idle handle may sit in the queue before the trimmer reclaims
/// it back down to `idle_size`.
const IDLE_LIFETIME: Duration = Duration::from_secs(60);
const TRIM_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub initial_size: usize,
    pub max_size: usize,
    pub idle_size: usize,
    pub checkout_timeout: Duration,
}

impl PoolConfig {
    /// `ES_CONN_POOL` defaults to the number of managed tables,
    /// `ES_IDLE_POOL` to a quarter of that.
    pub fn for_managed_tables(managed_tables: usize) -> Self {
        let max_size = managed_tables.max(1);
        let idle_size = (max_size / 4).max(1);
        Self {
            initial_size: idle_size,
            max_size,
            idle_size,
            checkout_timeout: Duration::from_secs(5),
        }
    }
}

struct Inner {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    idle: AsyncMutex<VecDeque<Instant>>,
    idle_size: usize,
    checkout_timeout: Duration,
}

pub struct ConnectionPool {
    inner: Arc<Inner>,
}

impl ConnectionPool {
    pub fn new(config: PoolConfig) -> Self {
        let idle = (0..config.initial_size).map(|_| Instant::now()).collect();
        let inner = Arc::new(Inner {
            client: reqwest::Client::new(),
            semaphore: Arc::new(Semaphore::new(config.max_size)),
            idle: AsyncMutex::new(idle),
            idle_size: config.idle_size,
            checkout_timeout: config.checkout_timeout,
        });
        spawn_trimmer(Arc::downgrade(&inner));
        Self { inner }
    }

    /// Acquires one connection, bounded by `checkout_timeout`. The caller
    /// releases it implicitly by dropping the returned handle on any exit
    /// path.
    pub async fn checkout(&self) -> Result<PooledConnection, TransportError> {
        let permit = tokio::time::timeout(
            self.inner.checkout_timeout,
            self.inner.semaphore.clone().acquire_owned(),
        )
        .await
        .map_err(|_| TransportError::PoolTimeout(self.inner.checkout_timeout))?
        .expect("pool semaphore is never closed while the pool is alive");

        self.inner.idle.lock().await.pop_front();

        Ok(PooledConnection {
            inner: self.inner.clone(),
            client: self.inner.client.clone(),
            _permit: permit,
        })
    }
}

/// A checked-out connection. Holds a cloned `reqwest::Client` (cheap: it's
/// an `Arc` internally) and the semaphore permit that bounds pool
/// concurrency. Returns itself to the idle queue on drop.
pub struct PooledConnection {
    inner: Arc<Inner>,
    client: reqwest::Client,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let inner = self.inner.clone();
        if let Ok(mut idle) = inner.idle.try_lock() {
            idle.push_back(Instant::now());
        }
    }
}

fn spawn_trimmer(inner: Weak<Inner>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(TRIM_INTERVAL).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let mut idle = inner.idle.lock().await;
            let now = Instant::now();
            while idle.len() > inner.idle_size {
                match idle.front() {
                    Some(oldest) if now.duration_since(*oldest) >= IDLE_LIFETIME => {
                        idle.pop_front();
                    },
                    _ => break,
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn checkout_releases_on_drop() {
        let pool = ConnectionPool::new(PoolConfig {
            initial_size: 1,
            max_size: 1,
            idle_size: 1,
            checkout_timeout: Duration::from_millis(200),
        });
        {
            let _conn = pool.checkout().await.unwrap();
            // A second checkout should time out while the first is held.
            assert!(pool.checkout().await.is_err());
        }
        // Dropped: the permit is free again.
        assert!(pool.checkout().await.is_ok());
    }
}
