//! Untyped column projection.
//!
//! For callers that do not declare a record type: each row becomes a map
//! from the requested column names to their values, in column order. Unlike
//! record decoding there is no zero value to fall back to, so a column the
//! row does not carry aborts the whole result.

use crate::error::QueryError;
use crate::source::RowSource;
use crate::value::Value;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// One projected row.
pub type ColumnRow = IndexMap<String, Value>;

/// Read `columns` from every row of `source`, in row order.
pub fn load_columns<S: AsRef<str>>(
    source: &dyn RowSource,
    columns: &[S],
) -> Result<Vec<ColumnRow>, QueryError> {
    let count = source.count()?;
    debug!(rows = count, columns = columns.len(), "projecting columns");

    let mut rows = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    for index in 0..count {
        let row = source.row_at(index)?;
        let mut projected = ColumnRow::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            match row.get_property(column)? {
                Some(value) => {
                    projected.insert(column.to_string(), value);
                }
                None => {
                    warn!(row = index, column, "column missing, aborting");
                    return Err(QueryError::MissingColumn {
                        row: index,
                        column: column.to_string(),
                    });
                }
            }
        }
        rows.push(projected);
    }
    Ok(rows)
}
