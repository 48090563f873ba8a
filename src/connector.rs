use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, info};

use crate::actions::{
    ActionKind, CreateTableInput, DeleteDataInput, DropTableInput, EmptyOutput, InsertDataInput,
    QueryDataInput, ResultOutput, UpdateDataInput,
};
use crate::config::ConnectionConfig;
use crate::diagnostics::{DriverError, classify};
use crate::error::ConnectorError;
use crate::mssql::MssqlPoolOpener;
use crate::payload;
use crate::pool::{PoolManager, PoolOpener, SqlExecutor};
use crate::request::OperationRequest;
use crate::results::OperationResult;
use crate::statements::{self, BuildError};
use crate::types::ExecutionMode;

/// The integration's action handlers, sharing one lazily opened pool.
///
/// Each handler validates its input and builds its statement before it touches
/// the pool, so malformed input never opens a connection.
#[derive(Debug)]
pub struct Connector<O: PoolOpener = MssqlPoolOpener> {
    pools: PoolManager<O>,
}

impl Connector<MssqlPoolOpener> {
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_pool_manager(PoolManager::new(config))
    }
}

impl<O: PoolOpener> Connector<O> {
    #[must_use]
    pub fn with_pool_manager(pools: PoolManager<O>) -> Self {
        Self { pools }
    }

    #[must_use]
    pub fn pool_manager(&self) -> &PoolManager<O> {
        &self.pools
    }

    /// Check that the configured server is reachable, opening the pool.
    ///
    /// # Errors
    /// `ConnectorError::Connection` when the server cannot be reached or rejects
    /// the login.
    pub async fn register(&self) -> Result<(), ConnectorError> {
        self.pools.acquire().await?;
        Ok(())
    }

    /// # Errors
    /// `Validation` for malformed input, `Operation` when the statement is refused
    /// or fails, `Connection` when the pool cannot be opened.
    pub async fn create_table(&self, input: &CreateTableInput) -> Result<EmptyOutput, ConnectorError> {
        info!("Creating table: {}", input.table_name);
        let columns = payload::parse_columns(&input.data)?;
        let request = statements::create_table(&input.table_name, &columns);
        self.perform(
            || format!("failed to create table {}", input.table_name),
            request,
            ExecutionMode::Execute,
        )
        .await?;
        info!("Table created successfully");
        Ok(EmptyOutput {})
    }

    /// # Errors
    /// See [`Connector::create_table`].
    pub async fn drop_table(&self, input: &DropTableInput) -> Result<EmptyOutput, ConnectorError> {
        info!("Dropping table: {}", input.table_name);
        let request = statements::drop_table(&input.table_name);
        self.perform(
            || format!("failed to drop table {}", input.table_name),
            request,
            ExecutionMode::Execute,
        )
        .await?;
        info!("Table dropped successfully");
        Ok(EmptyOutput {})
    }

    /// Insert every row of `data` with one batched statement.
    ///
    /// # Errors
    /// See [`Connector::create_table`].
    pub async fn insert_data(&self, input: &InsertDataInput) -> Result<ResultOutput, ConnectorError> {
        info!("Inserting data into table: {}", input.table_name);
        let rows = payload::parse_rows(&input.data)?;
        let request = statements::insert_rows(&input.table_name, &rows);
        let result = self
            .perform(
                || format!("failed to insert data into {}", input.table_name),
                request,
                ExecutionMode::Execute,
            )
            .await?;
        info!(
            rows = result.total_rows_affected(),
            "Data inserted successfully"
        );
        Ok(ResultOutput { result })
    }

    /// # Errors
    /// See [`Connector::create_table`].
    pub async fn update_data(&self, input: &UpdateDataInput) -> Result<ResultOutput, ConnectorError> {
        info!("Updating data in table: {}", input.table_name);
        let fields = payload::parse_object(&input.data)?;
        let request = statements::update_rows(&input.table_name, &fields, &input.conditions);
        let result = self
            .perform(
                || format!("failed to update data in {}", input.table_name),
                request,
                ExecutionMode::Execute,
            )
            .await?;
        info!(
            rows = result.total_rows_affected(),
            "Data updated successfully"
        );
        Ok(ResultOutput { result })
    }

    /// # Errors
    /// See [`Connector::create_table`].
    pub async fn delete_data(&self, input: &DeleteDataInput) -> Result<ResultOutput, ConnectorError> {
        info!("Deleting data from table: {}", input.table_name);
        let request = statements::delete_rows(&input.table_name, &input.conditions);
        let result = self
            .perform(
                || format!("failed to delete data from {}", input.table_name),
                request,
                ExecutionMode::Execute,
            )
            .await?;
        info!(
            rows = result.total_rows_affected(),
            "Data deleted successfully"
        );
        Ok(ResultOutput { result })
    }

    /// Run a caller-written statement batch and return its record sets.
    ///
    /// # Errors
    /// See [`Connector::create_table`].
    pub async fn query_data(&self, input: &QueryDataInput) -> Result<ResultOutput, ConnectorError> {
        info!("Executing query");
        if input.query.trim().is_empty() {
            return Err(ConnectorError::Validation("query must not be empty".into()));
        }
        let request = Ok(OperationRequest::new(input.query.clone()));
        let result = self
            .perform(
                || "failed to execute query".to_string(),
                request,
                ExecutionMode::Query,
            )
            .await?;
        info!("Query executed successfully");
        Ok(ResultOutput { result })
    }

    /// Run `action` with a JSON input and return its JSON output.
    ///
    /// # Errors
    /// `Validation` when `input` does not match the action's input shape, otherwise
    /// whatever the action returns.
    pub async fn dispatch(
        &self,
        action: ActionKind,
        input: JsonValue,
    ) -> Result<JsonValue, ConnectorError> {
        match action {
            ActionKind::CreateTable => {
                to_json(&self.create_table(&serde_json::from_value(input)?).await?)
            }
            ActionKind::DropTable => to_json(&self.drop_table(&serde_json::from_value(input)?).await?),
            ActionKind::InsertData => {
                to_json(&self.insert_data(&serde_json::from_value(input)?).await?)
            }
            ActionKind::UpdateData => {
                to_json(&self.update_data(&serde_json::from_value(input)?).await?)
            }
            ActionKind::DeleteData => {
                to_json(&self.delete_data(&serde_json::from_value(input)?).await?)
            }
            ActionKind::QueryData => to_json(&self.query_data(&serde_json::from_value(input)?).await?),
        }
    }

    async fn perform<F>(
        &self,
        action: F,
        request: Result<OperationRequest, BuildError>,
        mode: ExecutionMode,
    ) -> Result<OperationResult, ConnectorError>
    where
        F: FnOnce() -> String,
    {
        let request = match request {
            Ok(request) => request,
            Err(BuildError::Invalid(message)) => return Err(ConnectorError::Validation(message)),
            Err(BuildError::Rejected(err)) => return Err(operation_failure(action(), &err)),
        };
        let pool = self.pools.acquire().await?;
        pool.run(&request, mode)
            .await
            .map_err(|err| operation_failure(action(), &err))
    }
}

fn operation_failure(action: String, err: &DriverError) -> ConnectorError {
    let cause = classify(err);
    cause.log();
    let err = ConnectorError::Operation { action, cause };
    error!("{err}");
    err
}

fn to_json<T: Serialize>(output: &T) -> Result<JsonValue, ConnectorError> {
    serde_json::to_value(output)
        .map_err(|e| ConnectorError::Validation(format!("cannot serialize output: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diagnostics::{ErrorCategory, RequestCode};
    use crate::test_utils::FakeOpener;

    fn connector() -> (Connector<FakeOpener>, FakeOpener) {
        let opener = FakeOpener::new();
        let config = ConnectionConfig::builder("sa", "pw", "bots").build().unwrap();
        let connector =
            Connector::with_pool_manager(PoolManager::with_opener(config, opener.clone()));
        (connector, opener)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_table_runs_ddl() {
        let (connector, opener) = connector();
        let out = connector
            .create_table(&CreateTableInput {
                table_name: "users".into(),
                data: r#"{"id":"INT","name":"NVARCHAR(50)"}"#.into(),
            })
            .await
            .unwrap();
        assert_eq!(out, EmptyOutput {});

        let requests = opener.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0.sql(),
            "CREATE TABLE [users] ([id] INT, [name] NVARCHAR(50))"
        );
        assert_eq!(requests[0].1, ExecutionMode::Execute);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn refused_statement_never_opens_the_pool() {
        let (connector, opener) = connector();
        let err = connector
            .drop_table(&DropTableInput {
                table_name: "users; DROP DATABASE bots".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Request));
        assert!(err.to_string().starts_with("failed to drop table users; DROP DATABASE bots: "));
        assert_eq!(opener.opens(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn driver_failure_becomes_operation_failure() {
        let (connector, opener) = connector();
        opener.respond_with(Err(DriverError::request(
            RequestCode::Timeout,
            "Timeout: Request failed to complete in 15000ms",
        )));
        let err = connector
            .delete_data(&DeleteDataInput {
                table_name: "users".into(),
                conditions: "id = 1".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_operation_failure());
        let cause = err.classified().unwrap();
        assert_eq!(cause.code, "ETIMEOUT");
        assert_eq!(cause.message, "Request timeout.");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn dispatch_validates_input_shape() {
        let (connector, opener) = connector();
        let err = connector
            .dispatch(ActionKind::QueryData, json!({"sql": "SELECT 1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Validation(_)));

        let out = connector
            .dispatch(ActionKind::QueryData, json!({"query": "SELECT 1"}))
            .await
            .unwrap();
        assert_eq!(out, json!({"result": {"rowsAffected": [], "recordsets": []}}));
        assert_eq!(opener.requests()[0].1, ExecutionMode::Query);
    }
}
