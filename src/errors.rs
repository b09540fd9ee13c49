/*!
 * Error types for the studyme application.
 *
 * This module contains custom error types for the store, the durable slot and
 * document ingestion, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when loading, saving or replacing the store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The supplied bytes are not a readable SQLite database image
    #[error("Invalid store blob: {0}")]
    InvalidBlob(String),

    /// The durable slot holds text that is not valid base64
    #[error("Slot '{key}' is not valid base64: {source}")]
    SlotEncoding {
        /// Slot key that was read
        key: String,
        /// Underlying decode error
        #[source]
        source: base64::DecodeError,
    },

    /// Reading or writing the durable slot failed
    #[error("Slot I/O error: {0}")]
    SlotIo(#[from] std::io::Error),

    /// A referenced row does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (board, playlist, question)
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },
}

/// Errors that can occur while reading a document for ingestion
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document could not be read
    #[error("Failed to read document {path}: {source}")]
    Unreadable {
        /// Path of the document
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The document is not in a supported format
    #[error("Unsupported document: {0}")]
    Unsupported(String),

    /// The document bytes are not valid UTF-8 text
    #[error("Document {path} is not valid UTF-8: {source}")]
    InvalidText {
        /// Path of the document
        path: String,
        /// Underlying decode error
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from document ingestion
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit code for this kind of failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unknown(_) => 1,
            Self::File(_) => 3,
            Self::Store(_) => 4,
            Self::Document(_) => 5,
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        // Recover the typed error underneath any added context
        let error = match error.downcast::<StoreError>() {
            Ok(store) => return Self::Store(store),
            Err(error) => error,
        };
        let error = match error.downcast::<DocumentError>() {
            Ok(document) => return Self::Document(document),
            Err(error) => error,
        };
        match error.downcast::<std::io::Error>() {
            Ok(io) => Self::File(io.to_string()),
            Err(error) => Self::Unknown(format!("{:#}", error)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
