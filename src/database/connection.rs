/*!
 * Database connection management.
 *
 * The live store is an in-memory SQLite database. This module creates it,
 * serializes it to a byte blob and replaces it wholesale from a blob, using
 * the SQLite online backup API through a scratch file.
 */

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rusqlite::{Connection, DatabaseName, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::models::StoreStats;
use super::schema;
use crate::errors::StoreError;

/// Every SQLite database file starts with this header
const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

/// Name of the scratch file used while moving a blob in or out
const SCRATCH_FILENAME: &str = "store.sqlite";

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Create an empty in-memory store with the schema in place
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store holding the contents of a serialized blob
    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        let db = Self::new_in_memory()?;
        db.replace_from_blob(blob)?;
        Ok(db)
    }

    /// Execute a database operation with the connection
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

        f(&conn)
    }

    /// Execute a mutable database operation with the connection
    pub fn execute_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

        f(&mut conn)
    }

    /// Begin a transaction and execute operations within it
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T>,
    {
        let mut conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }

    /// Serialize the whole store to a SQLite database image
    pub fn export_blob(&self) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let path = scratch.path().join(SCRATCH_FILENAME);

        self.execute(|conn| {
            conn.backup(DatabaseName::Main, &path, None)
                .with_context(|| format!("Failed to back up store to {:?}", path))
        })?;

        let blob = std::fs::read(&path)
            .with_context(|| format!("Failed to read store image {:?}", path))?;

        debug!("Serialized store ({} bytes)", blob.len());
        Ok(blob)
    }

    /// Replace the entire live store with the contents of a blob.
    ///
    /// The blob is validated and restored into a fresh in-memory database
    /// sized to the image's page size; only then is the live store swapped out.
    pub fn replace_from_blob(&self, blob: &[u8]) -> Result<()> {
        if !blob.starts_with(SQLITE_HEADER) {
            return Err(StoreError::InvalidBlob(format!(
                "missing SQLite header ({} bytes supplied)",
                blob.len()
            ))
            .into());
        }

        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let path = scratch.path().join(SCRATCH_FILENAME);
        std::fs::write(&path, blob)
            .with_context(|| format!("Failed to write store image {:?}", path))?;

        let page_size = probe_image(&path)?;

        // In-memory targets cannot change page size once written, so restore into a new one
        let mut fresh =
            Connection::open_in_memory().context("Failed to create in-memory database")?;
        fresh
            .pragma_update(None, "page_size", page_size)
            .context("Failed to set page size")?;
        fresh
            .restore(
                DatabaseName::Main,
                &path,
                None::<fn(rusqlite::backup::Progress)>,
            )
            .context("Failed to restore store image")?;
        schema::initialize_schema(&fresh)?;

        self.execute_mut(|conn| {
            *conn = fresh;
            Ok(())
        })?;

        info!(
            "Replaced live store from blob ({} bytes, page size {})",
            blob.len(),
            page_size
        );
        Ok(())
    }

    /// Get row counts for every table
    pub fn stats(&self) -> Result<StoreStats> {
        self.execute(|conn| {
            let count = |table: &str| -> Result<i64> {
                Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?)
            };

            Ok(StoreStats {
                boards: count("boards")?,
                subjects: count("subjects")?,
                chapters: count("chapters")?,
                questions: count("questions")?,
                playlists: count("playlists")?,
                playlist_items: count("playlist_items")?,
            })
        })
    }
}

/// Open a store image read-only, make sure SQLite can read its catalogue and
/// return its page size
fn probe_image(path: &Path) -> Result<i64> {
    let probe = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| StoreError::InvalidBlob(e.to_string()))?;

    probe
        .query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| StoreError::InvalidBlob(e.to_string()))?;

    if !schema::has_study_tables(&probe).map_err(|e| StoreError::InvalidBlob(e.to_string()))? {
        warn!("Imported image is missing study tables, they will be created empty");
    }

    let page_size: i64 = probe
        .query_row("PRAGMA page_size", [], |row| row.get(0))
        .map_err(|e| StoreError::InvalidBlob(e.to_string()))?;

    Ok(page_size)
}
