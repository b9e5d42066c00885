// Display names for cluster labels, stored in SQLite

use rusqlite::{Connection, OptionalExtension, Result, params};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Label -> user-chosen name. Clustering never reads this; it only decorates
/// reports.
pub struct ClusterNames {
    conn: Connection,
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl ClusterNames {
    pub fn remove(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS cluster_names (
                label TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }

    /// Store `name` for `label`. Blank names are ignored and leave any
    /// existing name in place. Returns whether a name was written.
    pub fn set_name(&self, label: &str, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        self.conn.execute(
            "INSERT INTO cluster_names (label, name, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(label) DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at",
            params![label, name, current_timestamp()],
        )?;
        Ok(true)
    }

    pub fn get_name(&self, label: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT name FROM cluster_names WHERE label = ?1",
                params![label],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn all_names(&self) -> Result<HashMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT label, name FROM cluster_names ORDER BY label")?;

        let names = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<String, String>>>()?;

        Ok(names)
    }

    pub fn remove_name(&self, label: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM cluster_names WHERE label = ?1", params![label])?;
        Ok(removed > 0)
    }
}
