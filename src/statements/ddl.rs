use tracing::debug;

use super::BuildError;
use super::ident::{quote_identifier, quote_object_name, validate_column_type};
use crate::request::OperationRequest;

/// `CREATE TABLE` from `(column, type)` pairs, in the given order.
///
/// # Errors
/// `BuildError::Invalid` for an empty column list, `EINJECT` for invalid names or types.
pub fn create_table(
    table: &str,
    columns: &[(String, String)],
) -> Result<OperationRequest, BuildError> {
    let table = quote_object_name(table)?;
    if columns.is_empty() {
        return Err(BuildError::Invalid("a table needs at least one column".into()));
    }

    let definitions = columns
        .iter()
        .map(|(name, ty)| -> Result<String, BuildError> {
            Ok(format!("{} {}", quote_identifier(name)?, validate_column_type(ty)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let sql = format!("CREATE TABLE {table} ({})", definitions.join(", "));
    debug!(%sql, "built CREATE TABLE");
    Ok(OperationRequest::new(sql))
}

/// # Errors
/// `EINJECT` for an invalid table name.
pub fn drop_table(table: &str) -> Result<OperationRequest, BuildError> {
    Ok(OperationRequest::new(format!(
        "DROP TABLE {}",
        quote_object_name(table)?
    )))
}
