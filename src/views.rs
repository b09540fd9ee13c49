/*!
 * View containers and their plain-text rendering.
 *
 * The session does not draw anything itself; after each mutation it tells a
 * [`RefreshListener`] which views are stale. The render functions turn store
 * data into the text the CLI prints.
 */

use log::debug;
use std::fmt::Write;

use crate::database::models::{
    BoardRecord, PlaylistEntry, PlaylistRecord, PlaylistSummary, QuestionRecord, QuestionView,
};

/// Longest question excerpt shown inside a playlist
const PLAYLIST_EXCERPT_CHARS: usize = 200;

/// Named view containers that consume store data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Boards,
    Playlists,
    Questions,
    GeneratedPaper,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Boards => write!(f, "boards"),
            View::Playlists => write!(f, "playlists"),
            View::Questions => write!(f, "questions"),
            View::GeneratedPaper => write!(f, "generated"),
        }
    }
}

/// Receives notice that views must be redrawn
pub trait RefreshListener: Send {
    fn refresh(&mut self, views: &[View]);
}

/// Listener that only logs refresh requests
#[derive(Debug, Default)]
pub struct LogListener;

impl RefreshListener for LogListener {
    fn refresh(&mut self, views: &[View]) {
        for view in views {
            debug!("Refresh view: {}", view);
        }
    }
}

/// Board list, newest first
pub fn render_boards(boards: &[BoardRecord]) -> String {
    if boards.is_empty() {
        return "No boards yet\n".to_string();
    }

    let mut out = String::new();
    for board in boards {
        let _ = writeln!(out, "[{}] {}", board.id, board.name);
    }
    out
}

/// Question cards with metadata badges and the occurrence count
pub fn render_questions(questions: &[QuestionView]) -> String {
    if questions.is_empty() {
        return "No questions yet\n".to_string();
    }

    let mut out = String::new();
    for q in questions {
        let _ = writeln!(
            out,
            "#{} {} - {} marks{}",
            q.id,
            q.board.as_deref().unwrap_or(""),
            q.marks,
            q.year.map(|y| format!(" ({})", y)).unwrap_or_default()
        );
        let _ = writeln!(out, "    {}", q.text);

        let mut badges: Vec<String> = Vec::new();
        badges.extend(q.board.clone());
        badges.extend(q.subject.clone());
        badges.extend(q.chapter.clone());
        badges.extend(q.year.map(|y| y.to_string()));
        badges.push(format!("{}x", q.occurrences));
        let _ = writeln!(out, "    [{}]", badges.join("] ["));
    }
    out
}

/// Playlist list with item counts
pub fn render_playlists(playlists: &[PlaylistSummary]) -> String {
    if playlists.is_empty() {
        return "No playlists yet\n".to_string();
    }

    let mut out = String::new();
    for p in playlists {
        let _ = writeln!(
            out,
            "[{}] {} - {} question{}",
            p.id,
            p.name,
            p.item_count,
            if p.item_count != 1 { "s" } else { "" }
        );
    }
    out
}

/// Most recently created playlists, newest first
pub fn render_recent_playlists(playlists: &[PlaylistRecord]) -> String {
    if playlists.is_empty() {
        return "No playlists yet\n".to_string();
    }

    let mut out = String::from("Recent playlists\n");
    for p in playlists {
        let _ = writeln!(out, "[{}] {}", p.id, p.name);
    }
    out
}

/// Questions inside one playlist, text cut to a short excerpt
pub fn render_playlist_contents(entries: &[PlaylistEntry]) -> String {
    if entries.is_empty() {
        return "No questions in this playlist\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        let excerpt: String = entry.text.chars().take(PLAYLIST_EXCERPT_CHARS).collect();
        let _ = writeln!(out, "#{} {} marks", entry.question_id, entry.marks);
        let _ = writeln!(out, "    {}", excerpt);
    }
    out
}

/// A generated mock test paper
pub fn render_paper(paper: &[QuestionRecord]) -> String {
    let mut out = String::from("Generated MTP\n");
    for (i, q) in paper.iter().enumerate() {
        let _ = writeln!(out, "{}. [{} marks] {}", i + 1, q.marks, q.text);
    }
    out
}
