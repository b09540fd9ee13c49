/*!
 * Session module for interactive use of the study store.
 *
 * This module provides:
 * - The explicit active-board context
 * - Every user-facing operation over the store
 * - Persistence of the store after each mutation
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::StudySession;
pub use models::{ImportOutcome, NewQuestion};
