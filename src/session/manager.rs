/*!
 * Study session over the persisted store.
 *
 * This module handles:
 * - Loading the store from the durable slot, or starting empty
 * - Tracking the active board that scopes question lists and papers
 * - Persisting the whole store after every mutation
 * - Telling the refresh listener which views went stale
 */

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::types::Value;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::database::models::{
    BoardRecord, DEFAULT_MARKS, PlaylistEntry, PlaylistRecord, PlaylistSummary, QueryOutcome,
    QuestionRecord, QuestionView, StoreStats, SubjectRecord,
};
use crate::database::repository::Repository;
use crate::database::slot::{self, DurableSlot, FileSlot, MemorySlot};
use crate::database::DatabaseConnection;
use crate::document::{self, PageSource, TextDocument};
use crate::errors::StoreError;
use crate::paper::{MarkPreferences, PaperGenerator};
use crate::quick_add;
use crate::views::{LogListener, RefreshListener, View};

use super::models::{ImportOutcome, NewQuestion};

/// One interactive session over the study store
pub struct StudySession {
    /// Repository over the live store
    repo: Repository,
    /// Durable home of the serialized store
    slot: Box<dyn DurableSlot>,
    /// Application configuration
    config: Config,
    /// Board that scopes question lists, inserts and papers
    active_board: Option<i64>,
    /// Paper sampler
    generator: PaperGenerator,
    /// Random source for paper generation
    rng: StdRng,
    /// Consumer of view refresh notices
    listener: Box<dyn RefreshListener>,
}

impl StudySession {
    /// Open the session backed by the configured data directory
    pub fn open(config: Config) -> Result<Self> {
        let slot = FileSlot::new(config.store.resolved_data_dir()?);
        info!("Using store slot in {:?}", slot.dir());
        Self::open_with(Box::new(slot), config)
    }

    /// Open the session on an arbitrary slot.
    ///
    /// A saved blob is restored; otherwise the store starts empty.
    pub fn open_with(slot: Box<dyn DurableSlot>, config: Config) -> Result<Self> {
        let key = config.store.slot_key.clone();

        let db = match slot.read(&key)? {
            Some(text) => {
                let blob = slot::decode_blob(&key, &text)?;
                info!("Loading saved store from slot '{}' ({} bytes)", key, blob.len());
                DatabaseConnection::from_blob(&blob)
                    .with_context(|| format!("Saved store in slot '{}' is unreadable", key))?
            }
            None => {
                info!("No saved store in slot '{}', starting empty", key);
                DatabaseConnection::new_in_memory()?
            }
        };

        let mut session = Self {
            repo: Repository::new(db),
            slot,
            generator: PaperGenerator::new(config.paper.preferred_extra_copies),
            config,
            active_board: None,
            rng: StdRng::from_os_rng(),
            listener: Box::new(LogListener),
        };

        session
            .listener
            .refresh(&[View::Boards, View::Playlists, View::Questions]);
        Ok(session)
    }

    /// Open a throwaway session kept entirely in memory
    pub fn in_memory() -> Result<Self> {
        Self::open_with(Box::new(MemorySlot::new()), Config::default())
    }

    /// Replace the refresh listener
    pub fn with_listener(mut self, listener: Box<dyn RefreshListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Use a seeded random source, making papers reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Get the underlying repository
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Get the session configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serialize the store and overwrite the durable slot
    fn persist(&self) -> Result<()> {
        let blob = self.repo.connection().export_blob()?;
        self.slot
            .write(&self.config.store.slot_key, &slot::encode_blob(&blob))?;
        debug!("Persisted store ({} bytes)", blob.len());
        Ok(())
    }

    /// Persist, then refresh the given views
    fn commit(&mut self, views: &[View]) -> Result<()> {
        self.persist()?;
        self.listener.refresh(views);
        Ok(())
    }

    // =========================================================================
    // Boards
    // =========================================================================

    /// Create a board
    pub fn create_board(&mut self, name: &str) -> Result<i64> {
        let id = self.repo.insert_board(name.trim())?;
        info!("Created board '{}' ({})", name.trim(), id);
        self.commit(&[View::Boards])?;
        Ok(id)
    }

    /// All boards, newest first
    pub fn boards(&self) -> Result<Vec<BoardRecord>> {
        self.repo.list_boards()
    }

    /// Look up one board
    pub fn board(&self, board_id: i64) -> Result<Option<BoardRecord>> {
        self.repo.get_board(board_id)
    }

    /// Subjects created under a board
    pub fn subjects(&self, board_id: i64) -> Result<Vec<SubjectRecord>> {
        self.repo.list_subjects(board_id)
    }

    /// Make a board the active context, or clear it with `None`
    pub fn select_board(&mut self, board_id: Option<i64>) -> Result<()> {
        if let Some(id) = board_id {
            if self.repo.get_board(id)?.is_none() {
                return Err(StoreError::NotFound { entity: "board", id }.into());
            }
        }

        self.active_board = board_id;
        self.listener.refresh(&[View::Questions]);
        Ok(())
    }

    /// The active board, if any
    pub fn active_board(&self) -> Option<i64> {
        self.active_board
    }

    // =========================================================================
    // Questions
    // =========================================================================

    /// Insert every line of a quick-add block. Returns the new question IDs.
    pub fn quick_add(&mut self, text: &str) -> Result<Vec<i64>> {
        let entries = quick_add::parse_block(text, &self.config.quick_add.defaults());

        let items = entries
            .into_iter()
            .map(|e| {
                let question =
                    QuestionRecord::new(self.active_board, e.marks, e.text).with_year(e.year);
                (question, e.subject, e.chapter)
            })
            .collect();

        let ids = self.repo.insert_placed_questions(items)?;
        info!("Quick-added {} question(s)", ids.len());

        self.commit(&[View::Questions])?;
        Ok(ids)
    }

    /// Insert one structured question
    pub fn add_question(&mut self, new: NewQuestion) -> Result<i64> {
        let marks = new
            .marks
            .filter(|m| *m != 0)
            .unwrap_or(self.config.quick_add.default_marks);

        let mut subject_id = None;
        let mut chapter_id = None;
        if let (Some(board_id), Some(subject)) = (self.active_board, new.subject.as_deref()) {
            let sid = self.repo.resolve_subject(board_id, subject)?;
            if let Some(chapter) = new.chapter.as_deref() {
                chapter_id = Some(self.repo.resolve_chapter(sid, chapter)?);
            }
            subject_id = Some(sid);
        }

        let mut question = QuestionRecord::new(self.active_board, marks, new.text)
            .with_placement(subject_id, chapter_id)
            .with_year(new.year);
        question.tags = new.tags;

        let id = self.repo.insert_question(&question)?;
        self.commit(&[View::Questions])?;
        Ok(id)
    }

    /// Insert one question per text block of a document
    pub fn ingest_document<S: PageSource + ?Sized>(&mut self, source: &S) -> Result<Vec<i64>> {
        let questions: Vec<QuestionRecord> = document::split_blocks(source)
            .into_iter()
            .map(|block| QuestionRecord::new(self.active_board, DEFAULT_MARKS, block))
            .collect();

        let ids = self.repo.insert_questions(&questions)?;
        info!("Ingested {} question block(s)", ids.len());

        self.commit(&[View::Questions])?;
        Ok(ids)
    }

    /// Read a document from disk and ingest it
    pub async fn ingest_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<i64>> {
        let document = TextDocument::load(path.as_ref()).await?;
        self.ingest_document(&document)
    }

    /// Questions of the active board (or all), newest first, with occurrence counts
    pub fn questions(&self) -> Result<Vec<QuestionView>> {
        self.repo.list_questions(self.active_board)
    }

    /// How many stored questions share this exact text
    pub fn occurrences(&self, text: &str) -> Result<i64> {
        self.repo.count_occurrences(text)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Create a playlist
    pub fn create_playlist(&mut self, name: &str) -> Result<i64> {
        let id = self.repo.insert_playlist(name.trim())?;
        info!("Created playlist '{}' ({})", name.trim(), id);
        self.commit(&[View::Playlists])?;
        Ok(id)
    }

    /// All playlists with item counts, newest first
    pub fn playlists(&self) -> Result<Vec<PlaylistSummary>> {
        self.repo.list_playlists()
    }

    /// The featured (most recent) playlists
    pub fn recent_playlists(&self) -> Result<Vec<PlaylistRecord>> {
        self.repo.recent_playlists(self.config.playlists.featured)
    }

    /// Delete a playlist and all of its items. Returns the number of items removed.
    pub fn delete_playlist(&mut self, playlist_id: i64) -> Result<usize> {
        let removed = self.repo.delete_playlist(playlist_id)?;
        info!("Deleted playlist {} ({} item(s))", playlist_id, removed);
        self.commit(&[View::Playlists])?;
        Ok(removed)
    }

    /// Append a question to a playlist; the same question may appear more than once
    pub fn add_to_playlist(&mut self, playlist_id: i64, question_id: i64) -> Result<i64> {
        if self.repo.get_playlist(playlist_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "playlist",
                id: playlist_id,
            }
            .into());
        }
        if self.repo.get_question(question_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "question",
                id: question_id,
            }
            .into());
        }

        let item = self.repo.add_playlist_item(playlist_id, question_id)?;
        self.commit(&[View::Playlists])?;
        Ok(item)
    }

    /// Remove a question from a playlist. Returns the number of items removed.
    pub fn remove_from_playlist(&mut self, playlist_id: i64, question_id: i64) -> Result<usize> {
        let removed = self.repo.remove_playlist_item(playlist_id, question_id)?;
        if removed == 0 {
            warn!(
                "Question {} was not in playlist {}",
                question_id, playlist_id
            );
        }
        self.commit(&[View::Playlists])?;
        Ok(removed)
    }

    /// Questions in a playlist, most recently added first
    pub fn playlist_contents(&self, playlist_id: i64) -> Result<Vec<PlaylistEntry>> {
        self.repo.playlist_contents(playlist_id)
    }

    /// Number of items in a playlist; zero once it is deleted
    pub fn playlist_item_count(&self, playlist_id: i64) -> Result<i64> {
        self.repo.playlist_item_count(playlist_id)
    }

    // =========================================================================
    // Papers
    // =========================================================================

    /// Draw a mock test paper from the active board's questions (or all)
    pub fn generate_paper(
        &mut self,
        count: usize,
        preferences: &MarkPreferences,
    ) -> Result<Vec<QuestionRecord>> {
        let pool = self.repo.question_pool(self.active_board)?;
        let paper = self
            .generator
            .generate(&pool, count, preferences, &mut self.rng);

        self.listener.refresh(&[View::GeneratedPaper]);
        Ok(paper)
    }

    // =========================================================================
    // Export / Import
    // =========================================================================

    /// The serialized store
    pub fn export_blob(&self) -> Result<Vec<u8>> {
        self.repo.connection().export_blob()
    }

    /// Write the serialized store to a file.
    ///
    /// When `target` is a directory the configured export filename is used.
    pub fn export_to_file<P: AsRef<Path>>(&self, target: P) -> Result<PathBuf> {
        let target = target.as_ref();
        let path = if target.is_dir() {
            target.join(&self.config.store.export_filename)
        } else {
            target.to_path_buf()
        };

        let blob = self.export_blob()?;
        std::fs::write(&path, &blob)
            .with_context(|| format!("Failed to write export file {:?}", path))?;

        info!("Exported store to {:?} ({} bytes)", path, blob.len());
        Ok(path)
    }

    /// Replace the whole store with a blob and persist it immediately
    pub fn import_blob(&mut self, blob: &[u8]) -> Result<ImportOutcome> {
        self.repo.connection().replace_from_blob(blob)?;

        let board_kept = match self.active_board {
            Some(id) => self.repo.get_board(id)?.is_some(),
            None => true,
        };
        if !board_kept {
            warn!("Active board no longer exists after import, clearing selection");
            self.active_board = None;
        }

        self.commit(&[View::Boards, View::Questions, View::Playlists])?;
        Ok(ImportOutcome {
            bytes: blob.len(),
            board_kept,
        })
    }

    /// Read an exported store file and import it
    pub async fn import_file<P: AsRef<Path>>(&mut self, path: P) -> Result<ImportOutcome> {
        let path = path.as_ref();
        let blob = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read import file {:?}", path))?;

        info!("Importing store from {:?}", path);
        self.import_blob(&blob)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Run an ad hoc parameterized query against the store
    pub fn query(&self, sql: &str, params: &[Value]) -> QueryOutcome {
        self.repo.run_query(sql, params)
    }

    /// Row counts for every table
    pub fn stats(&self) -> Result<StoreStats> {
        self.repo.stats()
    }
}
