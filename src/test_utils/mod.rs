//! In-memory stand-ins for the SQL Server pool, for tests that exercise the
//! connector without a server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::diagnostics::DriverError;
use crate::pool::{PoolOpener, SqlExecutor};
use crate::request::OperationRequest;
use crate::results::OperationResult;
use crate::types::ExecutionMode;

pub mod test_helpers;

pub use test_helpers::record_set_result;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Script {
    open_failures: Mutex<VecDeque<DriverError>>,
    responses: Mutex<VecDeque<Result<OperationResult, DriverError>>>,
    requests: Mutex<Vec<(OperationRequest, ExecutionMode)>>,
}

/// Opener that counts open attempts and hands out [`FakePool`]s.
///
/// Clones share their counters and scripts, so a test can keep a handle after
/// moving the opener into a `PoolManager`.
#[derive(Clone, Default)]
pub struct FakeOpener {
    opens: Arc<AtomicUsize>,
    delay: Option<Duration>,
    script: Arc<Script>,
}

impl FakeOpener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` open attempts with `err`.
    #[must_use]
    pub fn fail_first(self, count: usize, err: DriverError) -> Self {
        lock(&self.script.open_failures).extend(std::iter::repeat_n(err, count));
        self
    }

    /// Sleep this long inside every open attempt.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue the outcome of the next request run on any pool from this opener.
    pub fn respond_with(&self, outcome: Result<OperationResult, DriverError>) {
        lock(&self.script.responses).push_back(outcome);
    }

    /// Number of open attempts so far, failed ones included.
    #[must_use]
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Every request run so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<(OperationRequest, ExecutionMode)> {
        lock(&self.script.requests).clone()
    }
}

impl std::fmt::Debug for FakeOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeOpener")
            .field("opens", &self.opens())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PoolOpener for FakeOpener {
    type Pool = FakePool;

    async fn open(&self, _config: &ConnectionConfig) -> Result<FakePool, DriverError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = lock(&self.script.open_failures).pop_front() {
            return Err(err);
        }
        Ok(FakePool {
            script: Arc::clone(&self.script),
        })
    }
}

/// Pool that records requests and replays scripted outcomes.
///
/// Without a scripted outcome, `Execute` reports one affected row and `Query`
/// returns no result sets.
pub struct FakePool {
    script: Arc<Script>,
}

impl std::fmt::Debug for FakePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakePool").finish_non_exhaustive()
    }
}

#[async_trait]
impl SqlExecutor for FakePool {
    async fn run(
        &self,
        request: &OperationRequest,
        mode: ExecutionMode,
    ) -> Result<OperationResult, DriverError> {
        request.bind()?;
        lock(&self.script.requests).push((request.clone(), mode));
        if let Some(outcome) = lock(&self.script.responses).pop_front() {
            return outcome;
        }
        Ok(match mode {
            ExecutionMode::Execute => OperationResult::from_rows_affected(vec![1]),
            ExecutionMode::Query => OperationResult::from_record_sets(Vec::new()),
        })
    }
}
