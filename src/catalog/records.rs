//! Record source: executes a caller-supplied query and materializes rows.
//!
//! The query text comes straight from a schedulation definition and is
//! executed verbatim. It is privileged, caller-trusted content: whoever can
//! write schedulation definitions can run arbitrary SQL against the store.
//! No escaping or parameterization happens at this layer by design.

use std::time::Duration;

use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use crate::catalog::models::Record;
use crate::error_handling::ExportError;

/// Ordered column list plus all rows a query produced.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    /// Field names in first-row key order; empty when the query returned
    /// zero rows.
    pub fields: Vec<String>,
    /// Materialized rows in query order.
    pub records: Vec<Record>,
}

/// Executes `sql` verbatim and materializes every row.
///
/// A `deadline`, when given, bounds the whole fetch; an elapsed deadline
/// surfaces as [`ExportError::QueryDeadlineExceeded`]. Without one, a slow
/// or unbounded query blocks the batch, which is the inherited cron-model
/// behavior.
pub async fn fetch_records(
    pool: &SqlitePool,
    sql: &str,
    deadline: Option<Duration>,
) -> Result<RecordSet, ExportError> {
    let fetch = sqlx::query(sql).fetch_all(pool);

    let rows = match deadline {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| ExportError::QueryDeadlineExceeded(limit))??,
        None => fetch.await?,
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut record = Record::new();
        for (idx, column) in row.columns().iter().enumerate() {
            record.insert(column.name().to_string(), decode_value(row, idx)?);
        }
        records.push(record);
    }

    let fields = records
        .first()
        .map(|record| record.keys().cloned().collect())
        .unwrap_or_default();

    Ok(RecordSet { fields, records })
}

/// Decodes one column into a JSON scalar.
///
/// SQLite reports either the declared column type or the value's storage
/// class; both are matched loosely (any INT flavor becomes a JSON number,
/// etc.). BLOBs are carried as lossy UTF-8 text since every supported
/// output format is textual.
fn decode_value(row: &SqliteRow, idx: usize) -> Result<Value, ExportError> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    // SQLite stores booleans as integers, so the raw value's storage class
    // is INTEGER; only the declared column type reveals a boolean.
    let declared = row.columns()[idx].type_info().name().to_uppercase();
    if declared.contains("BOOL") {
        return Ok(Value::Bool(row.try_get::<bool, _>(idx)?));
    }

    let type_name = raw.type_info().name().to_uppercase();

    let value = if type_name.contains("INT") {
        Value::from(row.try_get::<i64, _>(idx)?)
    } else if type_name.contains("REAL")
        || type_name.contains("FLOA")
        || type_name.contains("DOUB")
        || type_name.contains("NUMERIC")
    {
        Value::from(row.try_get::<f64, _>(idx)?)
    } else if type_name.contains("BLOB") {
        let bytes = row.try_get::<Vec<u8>, _>(idx)?;
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Value::String(row.try_get::<String, _>(idx)?)
    };

    Ok(value)
}
