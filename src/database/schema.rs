/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the six study tables and handles
 * adoption of stores that were saved before schema versioning existed.
 */

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Tables every store must contain, in dependency order
pub const STUDY_TABLES: [&str; 6] = [
    "boards",
    "subjects",
    "chapters",
    "questions",
    "playlists",
    "playlist_items",
];

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        // Fresh database, or a legacy store with the tables but no version row
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        warn!(
            "Store was written with schema v{}, this build knows v{}",
            current_version, SCHEMA_VERSION
        );
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS boards (
            id INTEGER PRIMARY KEY,
            name TEXT
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY,
            board_id INTEGER REFERENCES boards(id),
            name TEXT
        );

        CREATE TABLE IF NOT EXISTS chapters (
            id INTEGER PRIMARY KEY,
            subject_id INTEGER REFERENCES subjects(id),
            name TEXT
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            board_id INTEGER REFERENCES boards(id),
            subject_id INTEGER REFERENCES subjects(id),
            chapter_id INTEGER REFERENCES chapters(id),
            marks INTEGER,
            year INTEGER,
            text TEXT,
            tags TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_questions_board ON questions(board_id);
        CREATE INDEX IF NOT EXISTS idx_questions_text ON questions(text);
        "#,
    )?;

    // Playlist items are deliberately not unique per (playlist, question)
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id INTEGER PRIMARY KEY,
            name TEXT
        );

        CREATE TABLE IF NOT EXISTS playlist_items (
            id INTEGER PRIMARY KEY,
            playlist_id INTEGER REFERENCES playlists(id),
            question_id INTEGER REFERENCES questions(id)
        );

        CREATE INDEX IF NOT EXISTS idx_playlist_items_playlist ON playlist_items(playlist_id);
        "#,
    )?;

    // Subject and chapter names are unique within their parent
    create_name_indexes(conn)?;

    info!("Database schema created successfully");
    Ok(())
}

/// Create the per-parent name uniqueness indexes.
///
/// Stores saved before the indexes existed may already hold duplicate names;
/// those keep working without the index.
fn create_name_indexes(conn: &Connection) -> Result<()> {
    let indexes = [
        ("idx_subjects_board_name", "subjects", "board_id"),
        ("idx_chapters_subject_name", "chapters", "subject_id"),
    ];

    for (index, table, parent) in indexes {
        let duplicates: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM (SELECT 1 FROM {table} GROUP BY {parent}, name HAVING COUNT(*) > 1)"
            ),
            [],
            |row| row.get(0),
        )?;

        if duplicates > 0 {
            warn!(
                "{} has {} duplicated names, skipping unique index {}",
                table, duplicates, index
            );
            continue;
        }

        conn.execute_batch(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {index} ON {table}({parent}, name);"
        ))?;
    }

    Ok(())
}

/// Check that every study table exists in the given database
pub fn has_study_tables(conn: &Connection) -> Result<bool> {
    for table in STUDY_TABLES {
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(false);
        }
    }
    Ok(true)
}
