pub mod notes_config;

pub use notes_config::NotesConfig;
