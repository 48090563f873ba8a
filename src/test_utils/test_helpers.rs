//! Helper utilities for building expected results in tests.

use std::sync::Arc;

use crate::results::{OperationResult, ResultSet};
use crate::types::RowValues;

/// A one-set query result with the given columns and rows.
#[must_use]
pub fn record_set_result(columns: &[&str], rows: Vec<Vec<RowValues>>) -> OperationResult {
    let mut set = ResultSet::with_capacity(rows.len());
    set.set_column_names(Arc::new(columns.iter().map(|c| (*c).to_string()).collect()));
    for row in rows {
        set.add_row_values(row);
    }
    OperationResult::from_record_sets(vec![set])
}
