//! `SQLite` implementation of [`QueryExecutor`], the raw console surface.
//!
//! Statements arrive as free text and are prepared as-is; parameters are only
//! ever bound, never spliced into the text.

use std::future::Future;

use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::query::Query;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use medtrack_app::ports::QueryExecutor;
use medtrack_domain::error::MedTrackError;
use medtrack_domain::query::{QueryResult, SqlValue};

use crate::error::StorageError;
use crate::pool::Database;

fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    param: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(value) => query.bind(value),
        SqlValue::Integer(value) => query.bind(value),
        SqlValue::Real(value) => query.bind(value),
        SqlValue::Text(value) => query.bind(value),
    }
}

#[derive(Clone, Copy)]
enum Storage {
    Null,
    Integer,
    Real,
    Blob,
    Text,
}

/// Convert one cell to JSON based on the value's runtime storage class.
fn cell(row: &SqliteRow, idx: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    let storage = if raw.is_null() {
        Storage::Null
    } else {
        match raw.type_info().name() {
            "INTEGER" | "BOOLEAN" => Storage::Integer,
            "REAL" => Storage::Real,
            "BLOB" => Storage::Blob,
            _ => Storage::Text,
        }
    };

    Ok(match storage {
        Storage::Null => Value::Null,
        Storage::Integer => Value::from(row.try_get::<i64, _>(idx)?),
        Storage::Real => serde_json::Number::from_f64(row.try_get::<f64, _>(idx)?)
            .map_or(Value::Null, Value::Number),
        Storage::Blob => Value::from(row.try_get::<Vec<u8>, _>(idx)?),
        Storage::Text => Value::from(row.try_get::<String, _>(idx)?),
    })
}

fn normalize(rows: &[SqliteRow]) -> Result<QueryResult, sqlx::Error> {
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|idx| cell(row, idx))
                .collect::<Result<Vec<Value>, _>>()
        })
        .collect::<Result<Vec<Vec<Value>>, _>>()?;

    Ok(QueryResult { columns, rows })
}

impl QueryExecutor for Database {
    fn execute(
        &self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> impl Future<Output = Result<QueryResult, MedTrackError>> + Send {
        let pool = self.pool.clone();
        let statement = statement.to_string();
        async move {
            let query = params
                .into_iter()
                .fold(sqlx::query(&statement), bind);
            let rows = query
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            let result = normalize(&rows).map_err(StorageError::from)?;
            tracing::debug!(rows = result.rows.len(), "statement executed");
            Ok(result)
        }
    }
}
