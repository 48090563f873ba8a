use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::diagnostics::{DriverError, classify};
use crate::error::ConnectorError;
use crate::mssql::MssqlPoolOpener;
use crate::request::OperationRequest;
use crate::results::OperationResult;
use crate::types::ExecutionMode;

/// Runs one request on a pooled connection.
#[async_trait]
pub trait SqlExecutor {
    /// # Errors
    /// Returns the classified driver failure of the checkout or the statement.
    async fn run(
        &self,
        request: &OperationRequest,
        mode: ExecutionMode,
    ) -> Result<OperationResult, DriverError>;
}

/// Opens a ready-to-use pool for a configuration.
///
/// An implementation must not report success until a connection to the server
/// has actually been established.
#[async_trait]
pub trait PoolOpener: Send + Sync {
    type Pool: SqlExecutor + Send + Sync + 'static;

    /// # Errors
    /// Returns the connection failure that prevented the pool from opening.
    async fn open(&self, config: &ConnectionConfig) -> Result<Self::Pool, DriverError>;
}

/// Lazily opens and then caches the single pool of a connector instance.
///
/// Concurrent first callers share one open attempt. A failed attempt leaves
/// nothing cached, so the next call tries again. Once open, the pool is never
/// replaced for the lifetime of the manager.
pub struct PoolManager<O: PoolOpener = MssqlPoolOpener> {
    config: ConnectionConfig,
    opener: O,
    pool: OnceCell<O::Pool>,
}

impl PoolManager<MssqlPoolOpener> {
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_opener(config, MssqlPoolOpener)
    }
}

impl<O: PoolOpener> PoolManager<O> {
    #[must_use]
    pub fn with_opener(config: ConnectionConfig, opener: O) -> Self {
        Self {
            config,
            opener,
            pool: OnceCell::new(),
        }
    }

    /// Return the cached pool, opening it on first use.
    ///
    /// # Errors
    /// Returns `ConnectorError::Connection` carrying the classified cause when the
    /// pool cannot be opened. The failure is logged before it is returned.
    pub async fn acquire(&self) -> Result<&O::Pool, ConnectorError> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        self.pool.get_or_try_init(|| self.open()).await
    }

    async fn open(&self) -> Result<O::Pool, ConnectorError> {
        debug!(
            host = self.config.host(),
            instance = self.config.instance_name(),
            database = self.config.database(),
            "opening SQL Server pool"
        );
        match self.opener.open(&self.config).await {
            Ok(pool) => {
                info!("Successfully connected to Microsoft SQL Server");
                Ok(pool)
            }
            Err(err) => {
                let classified = classify(&err);
                classified.log();
                let err = ConnectorError::Connection(classified);
                tracing::error!("{err}");
                Err(err)
            }
        }
    }

    /// The pool, if it has been opened already.
    #[must_use]
    pub fn get(&self) -> Option<&O::Pool> {
        self.pool.get()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pool.initialized()
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }
}

impl<O: PoolOpener> std::fmt::Debug for PoolManager<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{ConnectionCode, ErrorCategory};
    use crate::test_utils::FakeOpener;

    fn config() -> ConnectionConfig {
        ConnectionConfig::builder("sa", "pw", "bots").build().unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn caches_the_first_pool() {
        let manager = PoolManager::with_opener(config(), FakeOpener::new());
        assert!(!manager.is_open());

        let first = manager.acquire().await.unwrap();
        let second = manager.acquire().await.unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(manager.opener().opens(), 1);
        assert!(manager.is_open());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_open_is_retried() {
        let opener = FakeOpener::new().fail_first(
            1,
            DriverError::connection(ConnectionCode::Login, "Login failed for user 'sa'."),
        );
        let manager = PoolManager::with_opener(config(), opener);

        let err = manager.acquire().await.unwrap_err();
        assert!(err.is_connection_failure());
        assert_eq!(err.category(), Some(ErrorCategory::Connection));
        assert!(manager.get().is_none());

        manager.acquire().await.unwrap();
        assert_eq!(manager.opener().opens(), 2);
    }
}
