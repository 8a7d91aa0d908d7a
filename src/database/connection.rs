//! Database connection management

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use super::{migrations, queries, schema};

/// Database connection wrapper
pub struct Database {
    /// Path to the database file
    path: PathBuf,
    /// SQLite connection
    conn: Option<Connection>,
}

impl Database {
    /// Open the database at the specified path, creating it on first use.
    ///
    /// Ensures the schema exists, seeds the properties row for a fresh
    /// store and upgrades older stores to the current schema version.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;

        Ok(Self {
            path: path.to_path_buf(),
            conn: Some(conn),
        })
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Some(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        for sql in schema::CREATE_ALL_TABLES {
            conn.execute(sql, [])?;
        }

        if queries::get_properties(conn)?.is_none() {
            let store_id = Uuid::new_v4().to_string().replace('-', "");
            queries::set_properties(conn, &store_id, migrations::CURRENT_VERSION)?;
        }

        let version = migrations::get_database_version(conn)?;
        if !migrations::is_version_compatible(&version) {
            migrations::recreate_database(conn)?;
        } else if version != migrations::CURRENT_VERSION {
            migrations::upgrade_database(conn, &version)?;
            migrations::set_database_version(conn, migrations::CURRENT_VERSION)?;
        }

        Ok(())
    }

    /// Get a reference to the connection
    pub fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| CoreError::DatabaseError("Database not open".to_string()))
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the database connection
    pub fn close(&mut self) {
        self.conn = None;
    }

    /// Check if database is open
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Begin a transaction
    pub fn begin_transaction(&self) -> Result<()> {
        self.connection()?.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit_transaction(&self) -> Result<()> {
        self.connection()?.execute("COMMIT", [])?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback_transaction(&self) -> Result<()> {
        self.connection()?.execute("ROLLBACK", [])?;
        Ok(())
    }

    /// Force a WAL checkpoint to write all data to the main database file
    ///
    /// Uses TRUNCATE mode which checkpoints all frames and truncates the WAL file.
    pub fn checkpoint(&self) -> Result<()> {
        self.connection()?.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.close();
    }
}
