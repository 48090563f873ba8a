//! SQL Server connector for a bot-platform integration.
//!
//! A [`Connector`] exposes table and row actions over one lazily opened
//! connection pool. Driver failures are classified into a [`ClassifiedError`]
//! before they are logged and returned.

pub mod actions;
pub mod config;
pub mod connector;
pub mod diagnostics;
pub mod error;
pub mod mssql;
pub mod payload;
pub mod pool;
pub mod prelude;
pub mod request;
pub mod results;
pub mod statements;
pub mod translation;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use actions::ActionKind;
pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use connector::Connector;
pub use diagnostics::{ClassifiedError, DriverError, DriverErrorKind, ErrorCategory, classify};
pub use error::ConnectorError;
pub use pool::{PoolManager, PoolOpener, SqlExecutor};
pub use request::OperationRequest;
pub use results::{CustomDbRow, OperationResult, ResultSet};
pub use types::{ExecutionMode, RowValues};
