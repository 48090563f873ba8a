//! SQL text for the connector's actions.
//!
//! Table and column names are validated and bracket-quoted; values always travel
//! as bound parameters. Caller-supplied WHERE clauses are spliced in verbatim
//! once they are known to contain no statement terminator or comment.

use thiserror::Error;

use crate::diagnostics::DriverError;

mod ddl;
mod dml;
pub mod ident;

pub use ddl::{create_table, drop_table};
pub use dml::{MAX_INSERT_ROWS, MAX_PARAMS, delete_rows, insert_rows, update_rows};

/// Why a statement could not be built.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Input is incomplete or out of range.
    #[error("{0}")]
    Invalid(String),
    /// Input was refused the way the driver would refuse it.
    #[error(transparent)]
    Rejected(#[from] DriverError),
}
