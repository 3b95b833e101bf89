//! Persistent store for the application state blob.
//!
//! The whole state is one serialized document, read once at startup and
//! overwritten wholesale on every save.

pub mod memory;
pub mod sqlite;

use crate::error::NotesResult;

pub use memory::MemoryStateStore;
pub use sqlite::SqliteStateStore;

/// Durable key-value slot holding the raw serialized application state.
pub trait StateStore: Send {
    /// Raw document, or `None` when nothing has been saved yet.
    fn load(&self) -> NotesResult<Option<String>>;

    /// Replace the stored document.
    fn save(&self, raw: &str) -> NotesResult<()>;
}
