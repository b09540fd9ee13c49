/*!
 * # StudyMe - exam question organizer
 *
 * A Rust library for collecting past exam questions, grouping them into
 * playlists and drawing mock test papers from them.
 *
 * ## Features
 *
 * - Boards, subjects and chapters resolved by name
 * - Bulk entry through the pipe-separated quick-add format
 * - Occurrence counts for questions that repeat across papers
 * - Weighted mock test paper (MTP) sampling by preferred marks
 * - Playlists of questions
 * - Whole-store export and import as a single SQLite file
 * - Question ingestion from text documents
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: The SQLite store, its schema, repository and durable slot
 * - `session`: The interactive session and its active-board context
 * - `quick_add`: Quick-add line parser
 * - `paper`: Mock test paper sampler
 * - `document`: Document splitting and discovery
 * - `views`: View refresh notices and text rendering
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod document;
pub mod errors;
pub mod paper;
pub mod quick_add;
pub mod session;
pub mod views;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, DocumentError, StoreError};
pub use paper::{MarkPreferences, PaperGenerator};
pub use session::{ImportOutcome, NewQuestion, StudySession};
