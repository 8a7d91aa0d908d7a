//! Database migration logic for schema version upgrades
//!
//! Upgrades are additive and preserve existing rows. Destructive recreation
//! only happens for stores written by a newer, incompatible version.

use rusqlite::Connection;
use tracing::{info, warn};

use crate::error::Result;
use super::schema;

/// Current schema version
pub const CURRENT_VERSION: &str = "2";

/// Upgrade the store to the latest version
pub fn upgrade_database(conn: &Connection, current_version: &str) -> Result<()> {
    let version: u32 = current_version.parse().unwrap_or(1);

    if version < 2 {
        info!(from = version, to = CURRENT_VERSION, "upgrading complaint store schema");
        upgrade_to_v2(conn)?;
    }

    Ok(())
}

/// Upgrade from v1 to v2
/// Adds the lifecycle state column; existing rows become Pending
fn upgrade_to_v2(conn: &Connection) -> Result<()> {
    // Idempotent: the ALTER fails harmlessly when the column already exists
    let _ = conn.execute(
        "ALTER TABLE quejas_anonimas ADD COLUMN estado TEXT NOT NULL DEFAULT 'PENDIENTE'",
        [],
    );

    Ok(())
}

/// Check if a stored schema version can be opened by this build
pub fn is_version_compatible(version: &str) -> bool {
    let v: u32 = version.parse().unwrap_or(0);
    v <= CURRENT_VERSION.parse::<u32>().unwrap_or(2)
}

/// Get the current schema version from properties
pub fn get_database_version(conn: &Connection) -> Result<String> {
    let version: String = conn
        .query_row("SELECT version FROM store_properties LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or_else(|_| "1".to_string());

    Ok(version)
}

/// Set the schema version in properties
pub fn set_database_version(conn: &Connection, version: &str) -> Result<()> {
    conn.execute("UPDATE store_properties SET version = ?", [version])?;
    Ok(())
}

/// Drop and recreate the complaint table at the current version.
/// All stored complaints are lost; the store identity survives.
pub fn recreate_database(conn: &Connection) -> Result<()> {
    warn!("incompatible schema version, recreating complaint table");
    conn.execute("DROP TABLE IF EXISTS quejas_anonimas", [])?;
    for sql in schema::CREATE_ALL_TABLES {
        conn.execute(sql, [])?;
    }
    set_database_version(conn, CURRENT_VERSION)?;
    Ok(())
}
