//! Notes core: the note repository, its derived search index, query syntax
//! and backup documents.

pub mod backup;
pub mod query;
pub mod repository;
pub mod search;

pub use repository::NoteRepository;
pub use search::SearchIndex;
