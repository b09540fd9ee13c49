/*!
 * Session data models and DTOs.
 */

use serde::{Deserialize, Serialize};

/// A single question entered through the form path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    /// Question text
    pub text: String,
    /// Marks; the configured default when absent
    pub marks: Option<i64>,
    /// Subject name, resolved under the active board
    pub subject: Option<String>,
    /// Chapter name, resolved under the subject
    pub chapter: Option<String>,
    /// Exam year
    pub year: Option<i64>,
    /// Free-form tags
    pub tags: Option<String>,
}

impl NewQuestion {
    /// Create a question with only its text set
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Result of importing a store blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Blob size in bytes
    pub bytes: usize,
    /// Whether the previously active board survived the import
    pub board_kept: bool,
}
