use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::BuildError;
use super::ident::{quote_identifier, quote_object_name, validate_condition};
use crate::diagnostics::{DriverError, PreparedStatementCode, RequestCode};
use crate::request::{OperationRequest, is_valid_param_name};
use crate::types::RowValues;

/// Most rows a single `INSERT ... VALUES` accepts.
pub const MAX_INSERT_ROWS: usize = 1000;
/// Most parameters one request can carry.
pub const MAX_PARAMS: usize = 2100;

/// One batched `INSERT` for all rows.
///
/// Columns come from the first row; every other row must have exactly the same
/// keys. Values are bound as `@r{row}c{column}`.
///
/// # Errors
/// `BuildError::Invalid` for no rows, an empty first row or too many rows/values;
/// prepared-statement `EARGS` with one preceding error per mismatched row; `EINJECT`
/// for invalid table or column names.
pub fn insert_rows(
    table: &str,
    rows: &[Map<String, JsonValue>],
) -> Result<OperationRequest, BuildError> {
    let table = quote_object_name(table)?;
    let Some(first) = rows.first() else {
        return Err(BuildError::Invalid("at least one row is required".into()));
    };
    if first.is_empty() {
        return Err(BuildError::Invalid("rows must have at least one column".into()));
    }
    if rows.len() > MAX_INSERT_ROWS {
        return Err(BuildError::Invalid(format!(
            "at most {MAX_INSERT_ROWS} rows can be inserted at once, got {}",
            rows.len()
        )));
    }

    let columns: Vec<&String> = first.keys().collect();
    if rows.len() * columns.len() > MAX_PARAMS {
        return Err(BuildError::Invalid(format!(
            "an insert can bind at most {MAX_PARAMS} values, got {}",
            rows.len() * columns.len()
        )));
    }

    let mismatched: Vec<DriverError> = rows
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, row)| row.len() != columns.len() || !columns.iter().all(|c| row.contains_key(*c)))
        .map(|(idx, _)| {
            DriverError::prepared_statement(
                PreparedStatementCode::BadArgs,
                format!("Row {} does not have the same columns as the first row", idx + 1),
            )
        })
        .collect();
    if !mismatched.is_empty() {
        return Err(BuildError::Rejected(
            DriverError::prepared_statement(
                PreparedStatementCode::BadArgs,
                format!("{} row(s) do not match the columns of the first row", mismatched.len()),
            )
            .with_preceding(mismatched),
        ));
    }

    let quoted_columns = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut request = OperationRequest::new(String::new());
    let mut tuples = Vec::with_capacity(rows.len());
    for (r, row) in rows.iter().enumerate() {
        let mut placeholders = Vec::with_capacity(columns.len());
        for (c, column) in columns.iter().enumerate() {
            let name = format!("r{r}c{c}");
            placeholders.push(format!("@{name}"));
            let value = row.get(*column).map_or(RowValues::Null, RowValues::from_json);
            request.push_param(name, value);
        }
        tuples.push(format!("({})", placeholders.join(", ")));
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES {}",
        quoted_columns.join(", "),
        tuples.join(", ")
    );
    debug!(rows = rows.len(), columns = columns.len(), "built batched INSERT");
    Ok(request.with_sql(sql))
}

/// Parameterized `UPDATE`; each field is bound under its own key.
///
/// # Errors
/// `BuildError::Invalid` for no fields or no conditions; `EINJECT` for invalid names
/// or conditions; `EARGS` for fields that differ only by case.
pub fn update_rows(
    table: &str,
    fields: &Map<String, JsonValue>,
    conditions: &str,
) -> Result<OperationRequest, BuildError> {
    let table = quote_object_name(table)?;
    if fields.is_empty() {
        return Err(BuildError::Invalid("no fields to update".into()));
    }
    let conditions = validate_condition(conditions)?;

    let mut request = OperationRequest::new(String::new());
    let mut assignments = Vec::with_capacity(fields.len());
    for (idx, (key, value)) in fields.iter().enumerate() {
        if !is_valid_param_name(key) {
            return Err(BuildError::Rejected(DriverError::request(
                RequestCode::InjectionSuspected,
                format!("Invalid field name: {key:?}"),
            )));
        }
        if fields.keys().take(idx).any(|k| k.eq_ignore_ascii_case(key)) {
            return Err(BuildError::Rejected(DriverError::request(
                RequestCode::BadArgs,
                format!("Parameter @{key} was supplied more than once"),
            )));
        }
        assignments.push(format!("{} = @{key}", quote_identifier(key)?));
        request.push_param(key.clone(), RowValues::from_json(value));
    }

    let sql = format!(
        "UPDATE {table} SET {} WHERE {conditions}",
        assignments.join(", ")
    );
    Ok(request.with_sql(sql))
}

/// `DELETE` restricted by a caller-supplied condition.
///
/// # Errors
/// `BuildError::Invalid` for empty conditions; `EINJECT` for invalid names or conditions.
pub fn delete_rows(table: &str, conditions: &str) -> Result<OperationRequest, BuildError> {
    let table = quote_object_name(table)?;
    let conditions = validate_condition(conditions)?;
    Ok(OperationRequest::new(format!(
        "DELETE FROM {table} WHERE {conditions}"
    )))
}
