/*!
 * Document ingestion helpers.
 *
 * A page-oriented document is flattened into text, then cut into blocks at
 * blank lines; each block later becomes one question. There is no structure
 * awareness: headings, numbering and answers all end up as question text.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::DocumentError;

/// Page separator emitted by text extraction tools
pub const PAGE_BREAK: char = '\x0C';

/// Extensions accepted when ingesting a directory
const DOCUMENT_EXTENSIONS: [&str; 1] = ["txt"];

/// Anything that can hand out plain text one page at a time
pub trait PageSource {
    /// Plain text of each page, in page order
    fn pages(&self) -> Vec<String>;
}

/// Plain-text document whose pages are separated by form feeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    /// Build a document from page texts
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a document from extracted text, splitting pages at form feeds
    pub fn from_text(text: &str) -> Self {
        Self::from_pages(text.split(PAGE_BREAK))
    }

    /// Read a document from disk
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        if !is_supported(path) {
            return Err(DocumentError::Unsupported(path.display().to_string()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentError::Unreadable {
                path: path.display().to_string(),
                source,
            })?;

        let text = String::from_utf8(bytes).map_err(|source| DocumentError::InvalidText {
            path: path.display().to_string(),
            source,
        })?;
        let document = Self::from_text(&text);
        debug!("Loaded {:?} ({} pages)", path, document.pages.len());
        Ok(document)
    }
}

impl PageSource for TextDocument {
    fn pages(&self) -> Vec<String> {
        self.pages.clone()
    }
}

// Blank line, possibly holding whitespace, between two blocks
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Flatten pages and cut them into question blocks
pub fn split_blocks<S: PageSource + ?Sized>(source: &S) -> Vec<String> {
    let mut full_text = String::new();
    for page in source.pages() {
        full_text.push_str(&page);
        full_text.push_str("\n\n");
    }

    BLOCK_SEPARATOR
        .split(&full_text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(String::from)
        .collect()
}

/// Whether a path has a document extension this module can read
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Find every supported document under a directory, in path order
pub fn collect_documents<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    found.sort();
    found
}
