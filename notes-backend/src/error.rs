//! Error kinds surfaced by the notes core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotesError {
    /// An import document did not have the expected shape. State is unchanged.
    #[error("Invalid backup file format: {0}")]
    MalformedImport(String),

    /// Saving to the persistent store failed even after retrying.
    #[error("Failed to save notes: {0}")]
    PersistenceWriteFailure(String),

    /// Search syntax the index cannot interpret. Callers fall back to the full list.
    #[error("Invalid search query: {0}")]
    SearchQueryError(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type NotesResult<T> = Result<T, NotesError>;
