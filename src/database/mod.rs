/*!
 * Database module for the study store.
 *
 * This module provides SQLite-based persistence for:
 * - Boards, subjects and chapters
 * - Questions and their placement
 * - Playlists and their items
 * - The durable slot that keeps the serialized store between runs
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;
pub mod slot;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::Repository;
pub use slot::{DurableSlot, FileSlot, MemorySlot};
