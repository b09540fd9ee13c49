/*!
 * Common test utilities for the studyme test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use studyme::app_config::Config;
use studyme::views::{RefreshListener, View};
use studyme::StudySession;

/// Route library logs to the test harness output
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Config whose durable slot lives in the given directory
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.store.data_dir = Some(dir.to_path_buf());
    config
}

/// Opens a session persisted to a file slot in the given directory
pub fn open_file_session(dir: &Path) -> Result<StudySession> {
    init_test_logging();
    Ok(StudySession::open(config_in(dir))?.with_seed(42))
}

/// Opens a throwaway in-memory session with a fixed seed
pub fn memory_session() -> StudySession {
    init_test_logging();
    StudySession::in_memory()
        .expect("Failed to create in-memory session")
        .with_seed(42)
}

/// Listener that records every refresh request for later inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    seen: Arc<Mutex<Vec<View>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Views refreshed so far, in order
    pub fn seen(&self) -> Vec<View> {
        self.seen.lock().unwrap().clone()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

impl RefreshListener for RecordingListener {
    fn refresh(&mut self, views: &[View]) {
        self.seen.lock().unwrap().extend_from_slice(views);
    }
}

/// Session with one board selected and a few questions under it
pub fn seeded_session() -> Result<(StudySession, i64)> {
    let mut session = memory_session();
    let board = session.create_board("CBSE")?;
    session.select_board(Some(board))?;
    session.quick_add(
        "5|Physics|Motion|2021|What is velocity?\n\
         3|Physics|Motion|2020|Define acceleration.\n\
         2|Chemistry|Atoms|2019|What is an isotope?\n\
         1|Chemistry|Atoms||Name a noble gas.",
    )?;
    Ok((session, board))
}
