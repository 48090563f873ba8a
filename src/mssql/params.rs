use tiberius::Query;

use crate::request::BoundStatement;
use crate::types::RowValues;

/// Bind the values of a bound statement onto a tiberius query, in order.
pub(crate) fn bind_query_params<'a>(statement: &BoundStatement<'a>) -> Query<'a> {
    let mut query = Query::new(statement.sql.clone());

    for value in &statement.values {
        match value {
            RowValues::Int(i) => query.bind(*i),
            RowValues::Float(f) => query.bind(*f),
            RowValues::Text(s) => query.bind(s.clone()),
            RowValues::Bool(b) => query.bind(*b),
            RowValues::Timestamp(dt) => {
                query.bind(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
            }
            RowValues::Null => query.bind(Option::<String>::None),
            RowValues::JSON(json) => query.bind(json.to_string()),
            RowValues::Blob(bytes) => query.bind(bytes.clone()),
        }
    }

    query
}
