/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marks assigned when none are given or they cannot be parsed
pub const DEFAULT_MARKS: i64 = 3;

/// Exam board record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRecord {
    /// Database ID
    pub id: i64,
    /// Board name
    pub name: String,
}

/// Subject record, owned by a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// Database ID
    pub id: i64,
    /// Owning board
    pub board_id: i64,
    /// Subject name
    pub name: String,
}

/// Chapter record, owned by a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// Database ID
    pub id: i64,
    /// Owning subject
    pub subject_id: i64,
    /// Chapter name
    pub name: String,
}

/// Stored question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Database ID
    pub id: i64,
    /// Board the question was added under, if any
    pub board_id: Option<i64>,
    /// Resolved subject, if any
    pub subject_id: Option<i64>,
    /// Resolved chapter, if any
    pub chapter_id: Option<i64>,
    /// Marks awarded for the question
    pub marks: i64,
    /// Exam year, if known
    pub year: Option<i64>,
    /// Question text
    pub text: String,
    /// Free-form tags
    pub tags: Option<String>,
}

impl QuestionRecord {
    /// Create a new question record (without database ID)
    pub fn new(board_id: Option<i64>, marks: i64, text: String) -> Self {
        Self {
            id: 0, // Will be assigned by database
            board_id,
            subject_id: None,
            chapter_id: None,
            marks,
            year: None,
            text,
            tags: None,
        }
    }

    /// Attach a resolved subject and chapter
    pub fn with_placement(mut self, subject_id: Option<i64>, chapter_id: Option<i64>) -> Self {
        self.subject_id = subject_id;
        self.chapter_id = chapter_id;
        self
    }

    /// Attach an exam year
    pub fn with_year(mut self, year: Option<i64>) -> Self {
        self.year = year;
        self
    }
}

/// Question joined with its board, subject and chapter names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    /// Question ID
    pub id: i64,
    /// Question text
    pub text: String,
    /// Marks
    pub marks: i64,
    /// Exam year
    pub year: Option<i64>,
    /// Board name
    pub board: Option<String>,
    /// Subject name
    pub subject: Option<String>,
    /// Chapter name
    pub chapter: Option<String>,
    /// Number of stored questions with exactly the same text
    pub occurrences: i64,
}

/// Named playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    /// Database ID
    pub id: i64,
    /// Playlist name
    pub name: String,
}

/// Playlist with the number of items it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    /// Database ID
    pub id: i64,
    /// Playlist name
    pub name: String,
    /// Number of playlist_items rows, duplicates included
    pub item_count: i64,
}

/// Join row between a playlist and a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItemRecord {
    /// Database ID, also the insertion order
    pub id: i64,
    /// Playlist
    pub playlist_id: i64,
    /// Question
    pub question_id: i64,
}

/// Question as shown inside a playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Question ID
    pub question_id: i64,
    /// Question text
    pub text: String,
    /// Marks
    pub marks: i64,
}

/// Row counts for every table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub boards: i64,
    pub subjects: i64,
    pub chapters: i64,
    pub questions: i64,
    pub playlists: i64,
    pub playlist_items: i64,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Boards: {}, Subjects: {}, Chapters: {}, Questions: {}, Playlists: {}, Playlist items: {}",
            self.boards,
            self.subjects,
            self.chapters,
            self.questions,
            self.playlists,
            self.playlist_items
        )
    }
}

/// Tabular result of an ad hoc query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names in select order
    pub columns: Vec<String>,
    /// Rows of typed scalar values
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Whether the result holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row, if any
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// Outcome of the parameterized query entry point
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The statement ran
    Rows(ResultSet),
    /// The statement failed to prepare or run
    Failed(String),
}

impl QueryOutcome {
    /// Whether the statement failed
    pub fn is_failure(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }

    /// Rows of a successful query, or an empty set after logging the failure
    pub fn rows_or_log(self) -> ResultSet {
        match self {
            QueryOutcome::Rows(rows) => rows,
            QueryOutcome::Failed(reason) => {
                log::error!("SQL error: {}", reason);
                ResultSet::default()
            }
        }
    }
}

/// Render a scalar value the way it appears in listings
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(t) => t.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
