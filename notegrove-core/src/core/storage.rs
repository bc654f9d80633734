//! SQLite-backed storage for a Notegrove database file.

use crate::Result;
use rusqlite::Connection;
use std::path::Path;

/// Schema version written to `workspace_meta` on creation.
const SCHEMA_VERSION: &str = "1";

/// An open connection to a Notegrove SQLite database.
///
/// `Storage` owns the connection and the schema; all higher-level operations
/// go through [`crate::Workspace`].
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Creates a new database at `path` and initialises the schema.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.execute(
            "INSERT OR REPLACE INTO workspace_meta (key, value) VALUES ('schema_version', ?)",
            [SCHEMA_VERSION],
        )?;
        Ok(Self { conn })
    }

    /// Opens an existing database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotegroveError::InvalidDatabase`] if the file does not
    /// contain the expected tables, or [`crate::NotegroveError::Database`] for
    /// any SQLite failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN ('notes', 'note_tags', 'categories', 'workspace_meta')",
            [],
            |row| row.get(0),
        )?;

        if table_count != 4 {
            return Err(crate::NotegroveError::InvalidDatabase(
                "Not a valid Notegrove database".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
