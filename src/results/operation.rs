use std::collections::BTreeMap;

use serde::Serialize;

use super::result_set::ResultSet;
use crate::types::RowValues;

/// What a single request produced, in the shape the platform expects back.
///
/// `rows_affected` has one entry per statement of the batch. Record sets are only
/// present for requests run in [`ExecutionMode::Query`](crate::types::ExecutionMode).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub rows_affected: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recordset: Option<ResultSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recordsets: Option<Vec<ResultSet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<BTreeMap<String, RowValues>>,
}

impl OperationResult {
    /// Result of a statement run for its side effects.
    #[must_use]
    pub fn from_rows_affected(rows_affected: Vec<u64>) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    /// Result of a query. The server does not report counts through the row
    /// stream, so each record set contributes its own length.
    #[must_use]
    pub fn from_record_sets(recordsets: Vec<ResultSet>) -> Self {
        let rows_affected = recordsets.iter().map(|set| set.len() as u64).collect();
        Self {
            rows_affected,
            recordset: recordsets.first().cloned(),
            recordsets: Some(recordsets),
            output: None,
        }
    }

    /// Sum of all rows-affected counts.
    #[must_use]
    pub fn total_rows_affected(&self) -> u64 {
        self.rows_affected.iter().sum()
    }
}
