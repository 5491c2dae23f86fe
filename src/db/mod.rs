// src/db/mod.rs

//! SQLite-backed recipe registry
//!
//! Connections are opened per operation from a path; nothing holds a
//! connection across requests.

pub mod models;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Handle to the registry database
///
/// Cheap to clone; each call to [`Registry::connect`] opens a fresh
/// connection.
#[derive(Debug, Clone)]
pub struct Registry {
    db_path: PathBuf,
}

impl Registry {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn connect(&self) -> Result<Connection> {
        open(&self.db_path)
    }
}

/// Create the database (and its parent directory) and apply migrations
pub fn init(db_path: impl AsRef<Path>) -> Result<()> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    info!("Initializing registry database at {}", db_path.display());
    let conn = open(db_path)?;
    schema::migrate(&conn)?;
    Ok(())
}

/// Open an existing database with the pragmas every connection needs
pub fn open(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    let conn = Connection::open(db_path).map_err(|e| {
        Error::InitError(format!(
            "Failed to open database {}: {}",
            db_path.display(),
            e
        ))
    })?;

    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(conn)
}

/// Run `f` inside a transaction, committing on success
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&rusqlite::Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Cheap liveness probe used by the health endpoint
pub fn ping(db_path: impl AsRef<Path>) -> Result<()> {
    let conn = open(db_path)?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}
