use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool::managed::Pool;
use tokio::task::JoinHandle;
use tracing::debug;

use super::config::MssqlManager;
use super::executor;
use crate::config::ConnectionConfig;
use crate::diagnostics::{ConnectionCode, DriverError, Phase};
use crate::pool::{PoolOpener, SqlExecutor};
use crate::request::OperationRequest;
use crate::results::OperationResult;
use crate::types::ExecutionMode;

/// Pool of SQL Server connections for one configuration.
///
/// The idle reaper lives as long as the last clone of the pool.
#[derive(Clone)]
pub struct MssqlPool {
    inner: Pool<MssqlManager>,
    _reaper: Arc<IdleReaper>,
}

impl MssqlPool {
    fn new(inner: Pool<MssqlManager>, idle_timeout: Duration) -> Self {
        let reaper = IdleReaper::spawn(inner.clone(), idle_timeout);
        Self {
            inner,
            _reaper: Arc::new(reaper),
        }
    }
}

impl std::fmt::Debug for MssqlPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.inner.status();
        f.debug_struct("MssqlPool")
            .field("max_size", &status.max_size)
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

#[async_trait]
impl SqlExecutor for MssqlPool {
    async fn run(
        &self,
        request: &OperationRequest,
        mode: ExecutionMode,
    ) -> Result<OperationResult, DriverError> {
        let mut conn = self
            .inner
            .get()
            .await
            .map_err(|e| DriverError::from_pool(e, Phase::Request))?;
        executor::run(&mut conn, request, mode).await
    }
}

/// Opens [`MssqlPool`]s backed by tiberius.
#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlPoolOpener;

#[async_trait]
impl PoolOpener for MssqlPoolOpener {
    type Pool = MssqlPool;

    async fn open(&self, config: &ConnectionConfig) -> Result<MssqlPool, DriverError> {
        let pool = Pool::builder(MssqlManager::new(config.clone()))
            .max_size(config.max_size())
            .build()
            .map_err(|e| {
                DriverError::connection(
                    ConnectionCode::Driver,
                    format!("Failed to create SQL Server pool: {e}"),
                )
            })?;

        // The first checkout performs the login, so a bad configuration fails here
        // rather than on the first statement.
        let conn = pool
            .get()
            .await
            .map_err(|e| DriverError::from_pool(e, Phase::Connect))?;
        drop(conn);

        Ok(MssqlPool::new(pool, config.idle_timeout()))
    }
}

/// Background task evicting connections idle for longer than the idle timeout.
/// Aborted on drop, which releases its handle on the pool.
struct IdleReaper {
    task: JoinHandle<()>,
}

impl IdleReaper {
    fn spawn(pool: Pool<MssqlManager>, idle_timeout: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(idle_timeout);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if pool.is_closed() {
                    break;
                }
                let pruned = pool.retain(|_, metrics| metrics.last_used() < idle_timeout);
                debug!(
                    removed = pruned.removed.len(),
                    size = pool.status().size,
                    "pruned idle SQL Server connections"
                );
            }
        });
        Self { task }
    }
}

impl Drop for IdleReaper {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unopened_pool() -> Pool<MssqlManager> {
        let config = ConnectionConfig::builder("sa", "secret", "bots")
            .build()
            .unwrap();
        Pool::builder(MssqlManager::new(config))
            .max_size(2)
            .build()
            .unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn reaper_stops_with_the_last_pool_handle() {
        let pool = MssqlPool::new(unopened_pool(), Duration::from_millis(5));
        let clone = pool.clone();
        let task = pool._reaper.task.abort_handle();

        drop(pool);
        tokio::task::yield_now().await;
        assert!(!task.is_finished(), "a clone still holds the pool");

        drop(clone);
        for _ in 0..10 {
            if task.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(task.is_finished());
    }
}
