//! Generic record helpers over any [`Executor`]: the store itself or an
//! open unit of work.
//!
//! Entity tables keep the serialized record in a `data` JSON column next
//! to the indexed scalar columns.

use serde::Serialize;
use serde::de::DeserializeOwned;

use murmur_sql::{Executor, Row, Value};

use crate::service::SocialError;

/// Insert a record as JSON into a table with indexed columns.
pub(crate) fn insert_record<E: Executor + ?Sized, T: Serialize>(
    db: &E,
    table: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
) -> Result<(), SocialError> {
    let json = serde_json::to_string(record).map_err(|e| SocialError::Internal(e.to_string()))?;

    let mut cols = vec!["id", "data"];
    let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
    let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

    for (i, (col, val)) in indexes.iter().enumerate() {
        cols.push(col);
        placeholders.push(format!("?{}", i + 3));
        params.push(val.clone());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        cols.join(", "),
        placeholders.join(", "),
    );

    db.exec(&sql, &params)?;
    Ok(())
}

/// Replace a record's JSON data and indexed columns.
pub(crate) fn update_record<E: Executor + ?Sized, T: Serialize>(
    db: &E,
    table: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
) -> Result<(), SocialError> {
    let json = serde_json::to_string(record).map_err(|e| SocialError::Internal(e.to_string()))?;

    let mut sets = vec!["data = ?1".to_string()];
    let mut params = vec![Value::Text(json)];

    for (i, (col, val)) in indexes.iter().enumerate() {
        sets.push(format!("{} = ?{}", col, i + 2));
        params.push(val.clone());
    }

    let id_idx = params.len() + 1;
    params.push(Value::Text(id.to_string()));

    let sql = format!("UPDATE {} SET {} WHERE id = ?{}", table, sets.join(", "), id_idx);
    if db.exec(&sql, &params)? == 0 {
        return Err(SocialError::NotFound(format!("{}/{}", table, id)));
    }
    Ok(())
}

/// Get a record by id, deserializing the JSON `data` column.
pub(crate) fn get_record<E: Executor + ?Sized, T: DeserializeOwned>(
    db: &E,
    table: &str,
    id: &str,
) -> Result<T, SocialError> {
    find_record(db, table, "id", id)?
        .ok_or_else(|| SocialError::NotFound(format!("{}/{}", table, id)))
}

/// Find a single record by an indexed column.
pub(crate) fn find_record<E: Executor + ?Sized, T: DeserializeOwned>(
    db: &E,
    table: &str,
    column: &str,
    value: &str,
) -> Result<Option<T>, SocialError> {
    let sql = format!("SELECT data FROM {} WHERE {} = ?1", table, column);
    let rows = db.query(&sql, &[Value::Text(value.to_string())])?;
    rows.first().map(decode_row).transpose()
}

/// Deserialize the `data` column of a row.
pub(crate) fn decode_row<T: DeserializeOwned>(row: &Row) -> Result<T, SocialError> {
    let data = row
        .get_str("data")
        .ok_or_else(|| SocialError::Internal("missing data column".into()))?;
    serde_json::from_str(data).map_err(|e| SocialError::Internal(e.to_string()))
}

pub(crate) fn decode_rows<T: DeserializeOwned>(rows: &[Row]) -> Result<Vec<T>, SocialError> {
    rows.iter().map(decode_row).collect()
}

/// Run a `SELECT COUNT(*) AS cnt ...` query.
pub(crate) fn count<E: Executor + ?Sized>(
    db: &E,
    sql: &str,
    params: &[Value],
) -> Result<u64, SocialError> {
    let rows = db.query(sql, params)?;
    Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as u64)
}

/// Whether a query returns at least one row.
pub(crate) fn exists<E: Executor + ?Sized>(
    db: &E,
    sql: &str,
    params: &[Value],
) -> Result<bool, SocialError> {
    Ok(!db.query(sql, params)?.is_empty())
}

/// `?{start}, ?{start+1}, ...` for an IN list of `n` values.
pub(crate) fn placeholders(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn text_params<S: AsRef<str>>(values: &[S]) -> Vec<Value> {
    values
        .iter()
        .map(|v| Value::Text(v.as_ref().to_string()))
        .collect()
}
