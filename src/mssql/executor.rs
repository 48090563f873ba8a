use tracing::debug;

use super::config::MssqlClient;
use super::params::bind_query_params;
use super::query::collect_record_sets;
use crate::diagnostics::{DriverError, Phase};
use crate::request::OperationRequest;
use crate::results::OperationResult;
use crate::types::ExecutionMode;

/// Run a request on a checked-out client.
///
/// # Errors
/// Returns the mapped driver error if binding, execution or row decoding fails.
pub async fn run(
    client: &mut MssqlClient,
    request: &OperationRequest,
    mode: ExecutionMode,
) -> Result<OperationResult, DriverError> {
    match mode {
        ExecutionMode::Execute => execute(client, request).await,
        ExecutionMode::Query => query(client, request).await,
    }
}

/// Execute a statement and report the per-statement row counts.
///
/// # Errors
/// Returns the mapped driver error if binding or execution fails.
pub async fn execute(
    client: &mut MssqlClient,
    request: &OperationRequest,
) -> Result<OperationResult, DriverError> {
    let bound = request.bind()?;
    debug!(sql = %bound.sql, params = bound.values.len(), "executing statement");
    let query = bind_query_params(&bound);

    let result = query
        .execute(client)
        .await
        .map_err(|e| DriverError::from_tiberius(e, Phase::Request))?;

    Ok(OperationResult::from_rows_affected(
        result.rows_affected().to_vec(),
    ))
}

/// Run a statement batch and collect every result set it returns.
///
/// # Errors
/// Returns the mapped driver error if binding, execution or row decoding fails.
pub async fn query(
    client: &mut MssqlClient,
    request: &OperationRequest,
) -> Result<OperationResult, DriverError> {
    let bound = request.bind()?;
    debug!(sql = %bound.sql, params = bound.values.len(), "running query");
    let query = bind_query_params(&bound);

    let stream = query
        .query(client)
        .await
        .map_err(|e| DriverError::from_tiberius(e, Phase::Request))?;
    let sets = collect_record_sets(stream).await?;

    Ok(OperationResult::from_record_sets(sets))
}
