//! SQL query operations for the local complaint store
//!
//! This module provides low-level query functions over an open connection.
//! For store-level operations, use the LocalComplaintStore API.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use crate::error::{CoreError, Result};
use crate::status::ComplaintStatus;
use super::models::{AnonymousComplaint, NewAnonymousComplaint, StoreProperties};

/// Timestamp format used in the properties table
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a DateTime for the properties table
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp from the properties table
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    chrono::NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Get current timestamp formatted for the properties table
pub fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

/// Convert a DateTime to the integer epoch milliseconds stored in `fecha_creacion`
pub fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Read a `fecha_creacion` value back into a DateTime
pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Current time truncated to the millisecond, so an assigned filing time
/// compares equal to its stored value
pub fn now_millis() -> DateTime<Utc> {
    timestamp_from_millis(Utc::now().timestamp_millis()).unwrap_or_default()
}

// ============================================================================
// Properties queries
// ============================================================================

/// Get store properties
pub fn get_properties(conn: &Connection) -> Result<Option<StoreProperties>> {
    let result = conn.query_row(
        "SELECT database_id, version, create_timestamp FROM store_properties LIMIT 1",
        [],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        },
    );
    match result {
        Ok((database_id, version, create_timestamp)) => Ok(Some(StoreProperties {
            database_id,
            version,
            create_timestamp: create_timestamp.as_deref().and_then(parse_timestamp),
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Set properties (insert new row)
pub fn set_properties(conn: &Connection, database_id: &str, version: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO store_properties (database_id, version, create_timestamp) VALUES (?, ?, ?)",
        params![database_id, version, now_timestamp()],
    )?;
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
    Ok(())
}

// ============================================================================
// Complaint queries
// ============================================================================

fn map_complaint_row(row: &Row) -> rusqlite::Result<AnonymousComplaint> {
    let millis: i64 = row.get(7)?;
    let created_at = timestamp_from_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Integer,
            format!("timestamp out of range: {millis}").into(),
        )
    })?;
    let estado: String = row.get(8)?;
    let status = ComplaintStatus::from_db_token(&estado).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            8,
            rusqlite::types::Type::Text,
            format!("unknown status token: {estado}").into(),
        )
    })?;

    Ok(AnonymousComplaint {
        id: row.get(0)?,
        category: row.get(1)?,
        street: row.get(2)?,
        cross_streets: row.get(3)?,
        neighborhood: row.get(4)?,
        wait_time: row.get(5)?,
        description: row.get(6)?,
        created_at,
        status,
    })
}

const COMPLAINT_COLUMNS: &str =
    "id, tipo, calle, cruzamientos, colonia, tiempo_espera, descripcion, fecha_creacion, estado";

/// Insert a complaint, replacing any existing row with the same id.
/// Returns the id of the written row.
pub fn insert_complaint(
    conn: &Connection,
    complaint: &NewAnonymousComplaint,
    created_at: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT OR REPLACE INTO quejas_anonimas
         (id, tipo, calle, cruzamientos, colonia, tiempo_espera, descripcion, fecha_creacion, estado)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            complaint.id,
            complaint.category,
            complaint.street,
            complaint.cross_streets,
            complaint.neighborhood,
            complaint.wait_time,
            complaint.description,
            timestamp_to_millis(&created_at),
            complaint.status.db_token(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
    Ok(id)
}

/// Replace the row matching the record's id
pub fn update_complaint(conn: &Connection, complaint: &AnonymousComplaint) -> Result<()> {
    let rows = conn.execute(
        "UPDATE quejas_anonimas
         SET tipo = ?, calle = ?, cruzamientos = ?, colonia = ?, tiempo_espera = ?,
             descripcion = ?, fecha_creacion = ?, estado = ?
         WHERE id = ?",
        params![
            complaint.category,
            complaint.street,
            complaint.cross_streets,
            complaint.neighborhood,
            complaint.wait_time,
            complaint.description,
            timestamp_to_millis(&complaint.created_at),
            complaint.status.db_token(),
            complaint.id,
        ],
    )?;
    if rows == 0 {
        return Err(CoreError::ComplaintNotFound(complaint.id));
    }
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
    Ok(())
}

/// Delete the complaint with the given id (at most one row).
/// Returns true if a row was removed.
pub fn delete_complaint(conn: &Connection, id: i64) -> Result<bool> {
    let rows = conn.execute("DELETE FROM quejas_anonimas WHERE id = ?", params![id])?;
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
    Ok(rows > 0)
}

/// Delete every complaint. Returns the number of rows removed.
pub fn delete_all_complaints(conn: &Connection) -> Result<u32> {
    let rows = conn.execute("DELETE FROM quejas_anonimas", [])?;
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
    Ok(rows as u32)
}

/// Get a single complaint by id
pub fn get_complaint_by_id(conn: &Connection, id: i64) -> Result<Option<AnonymousComplaint>> {
    let result = conn.query_row(
        &format!("SELECT {COMPLAINT_COLUMNS} FROM quejas_anonimas WHERE id = ?"),
        params![id],
        map_complaint_row,
    );
    match result {
        Ok(complaint) => Ok(Some(complaint)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Get all complaints, newest filing time first
pub fn get_all_complaints(conn: &Connection) -> Result<Vec<AnonymousComplaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM quejas_anonimas
         ORDER BY fecha_creacion DESC, id DESC"
    ))?;
    let complaints = stmt.query_map([], map_complaint_row)?;
    complaints
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Get complaints in one category, newest filing time first
pub fn get_complaints_by_category(
    conn: &Connection,
    category: &str,
) -> Result<Vec<AnonymousComplaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM quejas_anonimas WHERE tipo = ?
         ORDER BY fecha_creacion DESC, id DESC"
    ))?;
    let complaints = stmt.query_map(params![category], map_complaint_row)?;
    complaints
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Get complaints in one neighborhood, newest filing time first
pub fn get_complaints_by_neighborhood(
    conn: &Connection,
    neighborhood: &str,
) -> Result<Vec<AnonymousComplaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM quejas_anonimas WHERE colonia = ?
         ORDER BY fecha_creacion DESC, id DESC"
    ))?;
    let complaints = stmt.query_map(params![neighborhood], map_complaint_row)?;
    complaints
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Get complaints in one lifecycle state, newest filing time first
pub fn get_complaints_by_status(
    conn: &Connection,
    status: ComplaintStatus,
) -> Result<Vec<AnonymousComplaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM quejas_anonimas WHERE estado = ?
         ORDER BY fecha_creacion DESC, id DESC"
    ))?;
    let complaints = stmt.query_map(params![status.db_token()], map_complaint_row)?;
    complaints
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Count all complaints
pub fn count_complaints(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM quejas_anonimas", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Count complaints in one category
pub fn count_complaints_by_category(conn: &Connection, category: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM quejas_anonimas WHERE tipo = ?",
        params![category],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}
