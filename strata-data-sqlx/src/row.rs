//! Conversion between JSON values and SQLite rows.

use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};
use strata_data::{DataError, Record};

use crate::error::SqlxErrorExt;

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// `sqlx::query(sql)` with every parameter bound in order.
pub(crate) fn bind_all(sql: &str, params: Vec<Value>) -> SqliteQuery<'_> {
    params.into_iter().fold(sqlx::query(sql), bind_value)
}

/// Bind one JSON value. Arrays and objects are stored as JSON text.
pub(crate) fn bind_value(query: SqliteQuery<'_>, value: Value) -> SqliteQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s),
        other => query.bind(other.to_string()),
    }
}

/// Read a row into a JSON object keyed by column name.
///
/// Values are decoded by their storage class; integers in a column declared
/// `BOOLEAN` become booleans.
pub(crate) fn row_to_record(row: &SqliteRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index).map_err(SqlxErrorExt::into_data_error)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let stored = raw.type_info().name().to_string();
            let declared = column.type_info().name();
            decode(row, index, &stored, declared)?
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode(row: &SqliteRow, index: usize, stored: &str, declared: &str) -> Result<Value, DataError> {
    let value = match stored {
        "INTEGER" | "BOOLEAN" => {
            let i: i64 = row.try_get_unchecked(index).map_err(SqlxErrorExt::into_data_error)?;
            if declared == "BOOLEAN" {
                Value::Bool(i != 0)
            } else {
                Value::from(i)
            }
        }
        "REAL" | "NUMERIC" => {
            let f: f64 = row.try_get_unchecked(index).map_err(SqlxErrorExt::into_data_error)?;
            Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
        }
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get_unchecked(index).map_err(SqlxErrorExt::into_data_error)?;
            Value::Array(bytes.into_iter().map(Value::from).collect())
        }
        _ => {
            let text: String = row.try_get_unchecked(index).map_err(SqlxErrorExt::into_data_error)?;
            Value::String(text)
        }
    };
    Ok(value)
}
