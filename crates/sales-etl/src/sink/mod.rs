//! Relational storage for cleaned tables.
//!
//! The sink always fully replaces the destination table: drop, create from
//! the DataFrame's columns, insert every row. All of it runs in a single
//! transaction on a connection that is closed when it goes out of scope, on
//! success and on failure alike.
//!
//! [`TableSink::save`] never propagates an error. Storage problems are
//! logged and reported as `false` so the caller can finish the run.

mod readback;
mod target;

pub use readback::{fetch_snapshot, fetch_table};
pub use target::ConnectionTarget;

use crate::error::{EtlError, Result, ResultExt};
use crate::utils::{DtypeCategory, get_dtype_category};
use chrono::DateTime;
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::params_from_iter;
use tracing::{debug, error, info};

/// Storage format for datetime cells.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Destination for a cleaned table.
///
/// Implementors provide [`TableSink::try_save`]; the provided
/// [`TableSink::save`] turns its outcome into a logged boolean.
pub trait TableSink: Send + Sync {
    /// Replace `table_name` at `connection` with the rows of `df`.
    ///
    /// Returns the number of rows written.
    fn try_save(&self, df: &DataFrame, connection: &str, table_name: &str) -> Result<usize>;

    /// Replace `table_name` at `connection` with the rows of `df`.
    ///
    /// Returns `true` on success. Failures are logged, never propagated.
    fn save(&self, df: &DataFrame, connection: &str, table_name: &str) -> bool {
        log_save_outcome(table_name, &self.try_save(df, connection, table_name))
    }
}

/// Log the outcome of a save and reduce it to a success flag.
pub(crate) fn log_save_outcome(table_name: &str, outcome: &Result<usize>) -> bool {
    match outcome {
        Ok(rows) => {
            info!(
                "Data successfully updated in the SQL table '{}' ({} rows).",
                table_name, rows
            );
            true
        }
        Err(e) => {
            error!("Error updating SQL table '{}': {}", table_name, e);
            false
        }
    }
}

/// SQLite-backed [`TableSink`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSink;

impl TableSink for SqliteSink {
    fn try_save(&self, df: &DataFrame, connection: &str, table_name: &str) -> Result<usize> {
        let target = ConnectionTarget::parse(connection)?;
        if df.width() == 0 {
            return Err(EtlError::InvalidConfig(
                "cannot create a table without columns".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(df.width());
        let mut definitions = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            let series = col.as_materialized_series();
            definitions.push(format!(
                "{} {}",
                quote_ident(series.name()),
                sql_type(series.dtype())
            ));
            let values = column_values(series)
                .context(format!("Preparing column '{}' for storage", series.name()))?;
            columns.push(values);
        }

        let table = quote_ident(table_name);
        let placeholders = vec!["?"; columns.len()].join(", ");
        let create_sql = format!("CREATE TABLE {} ({})", table, definitions.join(", "));
        let insert_sql = format!("INSERT INTO {} VALUES ({})", table, placeholders);
        debug!("{}", create_sql);

        let mut conn = target.open()?;
        let tx = conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", table))?;
        tx.execute_batch(&create_sql)?;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for row in 0..df.height() {
                stmt.execute(params_from_iter(columns.iter().map(|values| &values[row])))?;
            }
        }
        tx.commit()?;

        Ok(df.height())
    }
}

/// Save with the default SQLite sink.
pub fn save(df: &DataFrame, connection: &str, table_name: &str) -> bool {
    SqliteSink.save(df, connection, table_name)
}

/// Quote an SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQL column type for a polars dtype.
fn sql_type(dtype: &DataType) -> &'static str {
    match get_dtype_category(dtype) {
        DtypeCategory::Integer | DtypeCategory::Boolean => "INTEGER",
        DtypeCategory::Float => "REAL",
        DtypeCategory::Datetime => "TIMESTAMP",
        DtypeCategory::String | DtypeCategory::Other => "TEXT",
    }
}

/// Convert a column into SQLite values, one per row.
fn column_values(series: &Series) -> Result<Vec<Value>> {
    let values: Vec<Value> = match get_dtype_category(series.dtype()) {
        DtypeCategory::Integer => {
            let ints = series.cast(&DataType::Int64)?;
            ints.i64()?
                .into_iter()
                .map(|v| v.map_or(Value::Null, Value::Integer))
                .collect()
        }
        DtypeCategory::Float => {
            let floats = series.cast(&DataType::Float64)?;
            floats
                .f64()?
                .into_iter()
                .map(|v| v.map_or(Value::Null, Value::Real))
                .collect()
        }
        DtypeCategory::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, |b| Value::Integer(i64::from(b))))
            .collect(),
        DtypeCategory::Datetime => {
            let millis = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            millis
                .i64()?
                .into_iter()
                .map(|v| {
                    v.and_then(DateTime::from_timestamp_millis)
                        .map_or(Value::Null, |dt| {
                            Value::Text(dt.format(TIMESTAMP_FORMAT).to_string())
                        })
                })
                .collect()
        }
        DtypeCategory::String | DtypeCategory::Other => {
            let text = series.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
                .collect()
        }
    };

    Ok(values)
}
