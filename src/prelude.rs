//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::actions::{
    ActionKind, CreateTableInput, DeleteDataInput, DropTableInput, EmptyOutput, InsertDataInput,
    QueryDataInput, ResultOutput, UpdateDataInput,
};
pub use crate::config::ConnectionConfig;
pub use crate::connector::Connector;
pub use crate::diagnostics::{ClassifiedError, DriverError, ErrorCategory, classify};
pub use crate::error::ConnectorError;
pub use crate::mssql::{MssqlPool, MssqlPoolOpener};
pub use crate::pool::{PoolManager, PoolOpener, SqlExecutor};
pub use crate::request::OperationRequest;
pub use crate::results::{CustomDbRow, OperationResult, ResultSet};
pub use crate::types::{ExecutionMode, RowValues};
