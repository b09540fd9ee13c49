/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 */

use anyhow::{Result, anyhow};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::connection::DatabaseConnection;
use super::models::{
    BoardRecord, ChapterRecord, DEFAULT_MARKS, PlaylistEntry, PlaylistItemRecord, PlaylistRecord,
    PlaylistSummary, QueryOutcome, QuestionRecord, QuestionView, ResultSet, StoreStats,
    SubjectRecord,
};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an empty in-memory store
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Query entry point
    // =========================================================================

    /// Run a parameterized statement and collect its rows.
    ///
    /// Failures are reported as [`QueryOutcome::Failed`] rather than raised,
    /// so callers decide whether to log or surface them.
    pub fn run_query(&self, sql: &str, params: &[Value]) -> QueryOutcome {
        let result = self.db.execute(|conn| Self::run_query_sync(conn, sql, params));

        match result {
            Ok(rows) => QueryOutcome::Rows(rows),
            Err(e) => {
                debug!("Query failed: {} ({})", sql, e);
                QueryOutcome::Failed(e.to_string())
            }
        }
    }

    fn run_query_sync(conn: &Connection, sql: &str, params: &[Value]) -> Result<ResultSet> {
        let mut stmt = conn.prepare(sql)?;

        // Writes must go through the typed operations so they get persisted
        if !stmt.readonly() {
            return Err(anyhow!("only read-only statements are accepted: {}", sql.trim()));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ResultSet { columns, rows })
    }

    // =========================================================================
    // Board Operations
    // =========================================================================

    /// Insert a board and return its ID
    pub fn insert_board(&self, name: &str) -> Result<i64> {
        self.db.execute(|conn| {
            conn.execute("INSERT INTO boards (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// List boards, newest first
    pub fn list_boards(&self) -> Result<Vec<BoardRecord>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM boards ORDER BY id DESC")?;
            let boards = stmt
                .query_map([], |row| {
                    Ok(BoardRecord {
                        id: row.get(0)?,
                        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(boards)
        })
    }

    /// Get a board by ID
    pub fn get_board(&self, board_id: i64) -> Result<Option<BoardRecord>> {
        self.db.execute(|conn| {
            let board = conn
                .query_row(
                    "SELECT id, name FROM boards WHERE id = ?1",
                    [board_id],
                    |row| {
                        Ok(BoardRecord {
                            id: row.get(0)?,
                            name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        })
                    },
                )
                .optional()?;
            Ok(board)
        })
    }

    // =========================================================================
    // Subject and Chapter Operations
    // =========================================================================

    /// Find a subject by board and name, creating it when missing
    pub fn resolve_subject(&self, board_id: i64, name: &str) -> Result<i64> {
        self.db.execute(|conn| Self::resolve_subject_sync(conn, board_id, name))
    }

    /// Find-or-create a subject (synchronous version for use within transactions)
    fn resolve_subject_sync(conn: &Connection, board_id: i64, name: &str) -> Result<i64> {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM subjects WHERE board_id = ?1 AND name = ?2",
                params![board_id, name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO subjects (board_id, name) VALUES (?1, ?2)",
            params![board_id, name],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Created subject '{}' ({}) under board {}", name, id, board_id);
        Ok(id)
    }

    /// Find a chapter by subject and name, creating it when missing
    pub fn resolve_chapter(&self, subject_id: i64, name: &str) -> Result<i64> {
        self.db.execute(|conn| Self::resolve_chapter_sync(conn, subject_id, name))
    }

    fn resolve_chapter_sync(conn: &Connection, subject_id: i64, name: &str) -> Result<i64> {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM chapters WHERE subject_id = ?1 AND name = ?2",
                params![subject_id, name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO chapters (subject_id, name) VALUES (?1, ?2)",
            params![subject_id, name],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Created chapter '{}' ({}) under subject {}", name, id, subject_id);
        Ok(id)
    }

    /// List the subjects of a board
    pub fn list_subjects(&self, board_id: i64) -> Result<Vec<SubjectRecord>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, board_id, name FROM subjects WHERE board_id = ?1 ORDER BY name",
            )?;
            let subjects = stmt
                .query_map([board_id], |row| {
                    Ok(SubjectRecord {
                        id: row.get(0)?,
                        board_id: row.get(1)?,
                        name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(subjects)
        })
    }

    /// List the chapters of a subject
    pub fn list_chapters(&self, subject_id: i64) -> Result<Vec<ChapterRecord>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subject_id, name FROM chapters WHERE subject_id = ?1 ORDER BY name",
            )?;
            let chapters = stmt
                .query_map([subject_id], |row| {
                    Ok(ChapterRecord {
                        id: row.get(0)?,
                        subject_id: row.get(1)?,
                        name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(chapters)
        })
    }

    // =========================================================================
    // Question Operations
    // =========================================================================

    /// Insert a question and return its ID
    pub fn insert_question(&self, question: &QuestionRecord) -> Result<i64> {
        self.db.execute(|conn| Self::insert_question_sync(conn, question))
    }

    fn insert_question_sync(conn: &Connection, question: &QuestionRecord) -> Result<i64> {
        conn.execute(
            r#"
            INSERT INTO questions (board_id, subject_id, chapter_id, marks, year, text, tags)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                question.board_id,
                question.subject_id,
                question.chapter_id,
                question.marks,
                question.year,
                question.text,
                question.tags,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert placed questions in a single transaction.
    ///
    /// Each item carries its subject and chapter names; when the question has a
    /// board they are resolved (or created) under it before the insert.
    pub fn insert_placed_questions(
        &self,
        items: Vec<(QuestionRecord, String, String)>,
    ) -> Result<Vec<i64>> {
        self.db.transaction(|tx| {
            let mut ids = Vec::with_capacity(items.len());

            for (question, subject, chapter) in items {
                let question = match question.board_id {
                    Some(board_id) => {
                        let subject_id = Self::resolve_subject_sync(tx, board_id, &subject)?;
                        let chapter_id = Self::resolve_chapter_sync(tx, subject_id, &chapter)?;
                        question.with_placement(Some(subject_id), Some(chapter_id))
                    }
                    None => question,
                };

                ids.push(Self::insert_question_sync(tx, &question)?);
            }

            Ok(ids)
        })
    }

    /// Insert unplaced questions in a single transaction
    pub fn insert_questions(&self, questions: &[QuestionRecord]) -> Result<Vec<i64>> {
        self.db.transaction(|tx| {
            questions
                .iter()
                .map(|q| Self::insert_question_sync(tx, q))
                .collect()
        })
    }

    /// Get a question by ID
    pub fn get_question(&self, question_id: i64) -> Result<Option<QuestionRecord>> {
        self.db.execute(|conn| {
            let question = conn
                .query_row(
                    r#"
                    SELECT id, board_id, subject_id, chapter_id, marks, year, text, tags
                    FROM questions WHERE id = ?1
                    "#,
                    [question_id],
                    question_from_row,
                )
                .optional()?;
            Ok(question)
        })
    }

    /// All questions, optionally restricted to one board
    pub fn question_pool(&self, board_id: Option<i64>) -> Result<Vec<QuestionRecord>> {
        self.db.execute(|conn| {
            let mut sql = String::from(
                "SELECT id, board_id, subject_id, chapter_id, marks, year, text, tags FROM questions",
            );
            let mut args: Vec<Value> = Vec::new();
            if let Some(board_id) = board_id {
                sql.push_str(" WHERE board_id = ?1");
                args.push(Value::Integer(board_id));
            }
            sql.push_str(" ORDER BY id");

            let mut stmt = conn.prepare(&sql)?;
            let questions = stmt
                .query_map(params_from_iter(args.iter()), question_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(questions)
        })
    }

    /// List questions with their placement names, newest first.
    ///
    /// The occurrence count is looked up separately for every row.
    pub fn list_questions(&self, board_id: Option<i64>) -> Result<Vec<QuestionView>> {
        self.db.execute(|conn| {
            let mut sql = String::from(
                r#"
                SELECT q.id, q.text, q.marks, q.year, b.name, s.name, c.name
                FROM questions q
                LEFT JOIN boards b ON q.board_id = b.id
                LEFT JOIN subjects s ON q.subject_id = s.id
                LEFT JOIN chapters c ON q.chapter_id = c.id
                "#,
            );
            let mut args: Vec<Value> = Vec::new();
            if let Some(board_id) = board_id {
                sql.push_str(" WHERE q.board_id = ?1");
                args.push(Value::Integer(board_id));
            }
            sql.push_str(" ORDER BY q.id DESC");

            let mut stmt = conn.prepare(&sql)?;
            let mut views = stmt
                .query_map(params_from_iter(args.iter()), |row| {
                    Ok(QuestionView {
                        id: row.get(0)?,
                        text: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        marks: row.get::<_, Option<i64>>(2)?.unwrap_or(DEFAULT_MARKS),
                        year: row.get(3)?,
                        board: row.get(4)?,
                        subject: row.get(5)?,
                        chapter: row.get(6)?,
                        occurrences: 0,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            for view in &mut views {
                view.occurrences = Self::count_occurrences_sync(conn, &view.text)?;
            }

            Ok(views)
        })
    }

    /// Number of stored questions whose text matches exactly
    pub fn count_occurrences(&self, text: &str) -> Result<i64> {
        self.db.execute(|conn| Self::count_occurrences_sync(conn, text))
    }

    fn count_occurrences_sync(conn: &Connection, text: &str) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM questions WHERE text = ?1",
            [text],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // =========================================================================
    // Playlist Operations
    // =========================================================================

    /// Insert a playlist and return its ID
    pub fn insert_playlist(&self, name: &str) -> Result<i64> {
        self.db.execute(|conn| {
            conn.execute("INSERT INTO playlists (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Get a playlist by ID
    pub fn get_playlist(&self, playlist_id: i64) -> Result<Option<PlaylistRecord>> {
        self.db.execute(|conn| {
            let playlist = conn
                .query_row(
                    "SELECT id, name FROM playlists WHERE id = ?1",
                    [playlist_id],
                    playlist_from_row,
                )
                .optional()?;
            Ok(playlist)
        })
    }

    /// List playlists with item counts, newest first
    pub fn list_playlists(&self) -> Result<Vec<PlaylistSummary>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM playlists ORDER BY id DESC")?;
            let playlists = stmt
                .query_map([], playlist_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            playlists
                .into_iter()
                .map(|p| {
                    Ok(PlaylistSummary {
                        item_count: Self::playlist_item_count_sync(conn, p.id)?,
                        id: p.id,
                        name: p.name,
                    })
                })
                .collect()
        })
    }

    /// The most recently created playlists
    pub fn recent_playlists(&self, limit: usize) -> Result<Vec<PlaylistRecord>> {
        self.db.execute(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name FROM playlists ORDER BY id DESC LIMIT ?1")?;
            let playlists = stmt
                .query_map([limit as i64], playlist_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(playlists)
        })
    }

    /// Delete a playlist after removing its items. Returns the number of items removed.
    pub fn delete_playlist(&self, playlist_id: i64) -> Result<usize> {
        self.db.transaction(|tx| {
            let items = tx.execute(
                "DELETE FROM playlist_items WHERE playlist_id = ?1",
                [playlist_id],
            )?;
            tx.execute("DELETE FROM playlists WHERE id = ?1", [playlist_id])?;
            Ok(items)
        })
    }

    /// Append a question to a playlist. Duplicate pairs are allowed.
    pub fn add_playlist_item(&self, playlist_id: i64, question_id: i64) -> Result<i64> {
        self.db.execute(|conn| {
            conn.execute(
                "INSERT INTO playlist_items (playlist_id, question_id) VALUES (?1, ?2)",
                params![playlist_id, question_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Remove every item linking the question to the playlist
    pub fn remove_playlist_item(&self, playlist_id: i64, question_id: i64) -> Result<usize> {
        self.db.execute(|conn| {
            let removed = conn.execute(
                "DELETE FROM playlist_items WHERE playlist_id = ?1 AND question_id = ?2",
                params![playlist_id, question_id],
            )?;
            Ok(removed)
        })
    }

    /// Raw item rows of a playlist, newest first
    pub fn playlist_items(&self, playlist_id: i64) -> Result<Vec<PlaylistItemRecord>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, playlist_id, question_id FROM playlist_items WHERE playlist_id = ?1 ORDER BY id DESC",
            )?;
            let items = stmt
                .query_map([playlist_id], |row| {
                    Ok(PlaylistItemRecord {
                        id: row.get(0)?,
                        playlist_id: row.get(1)?,
                        question_id: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
    }

    /// Questions in a playlist, most recently added first
    pub fn playlist_contents(&self, playlist_id: i64) -> Result<Vec<PlaylistEntry>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT q.id, q.text, q.marks
                FROM questions q
                JOIN playlist_items pi ON pi.question_id = q.id
                WHERE pi.playlist_id = ?1
                ORDER BY pi.id DESC
                "#,
            )?;
            let entries = stmt
                .query_map([playlist_id], |row| {
                    Ok(PlaylistEntry {
                        question_id: row.get(0)?,
                        text: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        marks: row.get::<_, Option<i64>>(2)?.unwrap_or(DEFAULT_MARKS),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    /// Number of items in a playlist; zero for unknown playlists
    pub fn playlist_item_count(&self, playlist_id: i64) -> Result<i64> {
        self.db
            .execute(|conn| Self::playlist_item_count_sync(conn, playlist_id))
    }

    fn playlist_item_count_sync(conn: &Connection, playlist_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM playlist_items WHERE playlist_id = ?1",
            [playlist_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // =========================================================================
    // Store-wide Operations
    // =========================================================================

    /// Row counts for every table
    pub fn stats(&self) -> Result<StoreStats> {
        self.db.stats()
    }
}

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<QuestionRecord> {
    Ok(QuestionRecord {
        id: row.get(0)?,
        board_id: row.get(1)?,
        subject_id: row.get(2)?,
        chapter_id: row.get(3)?,
        marks: row.get::<_, Option<i64>>(4)?.unwrap_or(DEFAULT_MARKS),
        year: row.get(5)?,
        text: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        tags: row.get(7)?,
    })
}

fn playlist_from_row(row: &Row<'_>) -> rusqlite::Result<PlaylistRecord> {
    Ok(PlaylistRecord {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
    })
}
