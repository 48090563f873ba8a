use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::TryStreamExt;
use tiberius::{ColumnData, QueryItem, QueryStream, Row};

use crate::diagnostics::{DriverError, Phase};
use crate::results::ResultSet;
use crate::types::RowValues;

/// Drain a query stream into one `ResultSet` per result set the batch produced.
///
/// A new set starts at every metadata token, so empty result sets still show up
/// with their column names.
pub(crate) async fn collect_record_sets(
    mut stream: QueryStream<'_>,
) -> Result<Vec<ResultSet>, DriverError> {
    let mut sets: Vec<ResultSet> = Vec::new();

    while let Some(item) = stream
        .try_next()
        .await
        .map_err(|e| DriverError::from_tiberius(e, Phase::Request))?
    {
        match item {
            QueryItem::Metadata(meta) => {
                let mut set = ResultSet::with_capacity(10);
                set.set_column_names(Arc::new(
                    meta.columns().iter().map(|c| c.name().to_string()).collect(),
                ));
                sets.push(set);
            }
            QueryItem::Row(row) => {
                let values = convert_row(&row);
                if sets.is_empty() {
                    let mut set = ResultSet::with_capacity(10);
                    set.set_column_names(Arc::new(
                        row.columns().iter().map(|c| c.name().to_string()).collect(),
                    ));
                    sets.push(set);
                }
                if let Some(set) = sets.last_mut() {
                    set.add_row_values(values);
                }
            }
        }
    }

    Ok(sets)
}

fn convert_row(row: &Row) -> Vec<RowValues> {
    row.cells()
        .enumerate()
        .map(|(idx, (_, data))| match data {
            ColumnData::DateTime(Some(_))
            | ColumnData::SmallDateTime(Some(_))
            | ColumnData::DateTime2(Some(_)) => row
                .try_get::<NaiveDateTime, _>(idx)
                .ok()
                .flatten()
                .map_or(RowValues::Null, RowValues::Timestamp),
            ColumnData::DateTimeOffset(Some(_)) => row
                .try_get::<DateTime<Utc>, _>(idx)
                .ok()
                .flatten()
                .map_or(RowValues::Null, |dt| RowValues::Text(dt.to_rfc3339())),
            ColumnData::Date(Some(_)) => row
                .try_get::<NaiveDate, _>(idx)
                .ok()
                .flatten()
                .map_or(RowValues::Null, |d| RowValues::Text(d.format("%Y-%m-%d").to_string())),
            ColumnData::Time(Some(_)) => row
                .try_get::<NaiveTime, _>(idx)
                .ok()
                .flatten()
                .map_or(RowValues::Null, |t| RowValues::Text(t.format("%H:%M:%S%.f").to_string())),
            other => convert_cell(other),
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn convert_cell(data: &ColumnData<'_>) -> RowValues {
    match data {
        ColumnData::Bit(Some(b)) => RowValues::Bool(*b),
        ColumnData::U8(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I16(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I32(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I64(Some(v)) => RowValues::Int(*v),
        ColumnData::F32(Some(v)) => RowValues::Float(f64::from(*v)),
        ColumnData::F64(Some(v)) => RowValues::Float(*v),
        ColumnData::Numeric(Some(n)) => {
            RowValues::Float(n.value() as f64 / 10f64.powi(i32::from(n.scale())))
        }
        ColumnData::String(Some(s)) => RowValues::Text(s.to_string()),
        ColumnData::Guid(Some(g)) => RowValues::Text(g.to_string()),
        ColumnData::Binary(Some(b)) => RowValues::Blob(b.to_vec()),
        ColumnData::Xml(Some(xml)) => RowValues::Text(xml.to_string()),
        _ => RowValues::Null,
    }
}
