//! Markdown notes backend: note repository, ranked search, debounced
//! autosave and backups, served over actix-web.

pub mod autosave;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notes;
pub mod service;
pub mod workspace;

use config::Config;
use service::NotesService;

#[derive(Clone)]
pub struct AppState {
    pub notes: NotesService,
    pub config: Config,
    /// Server start time for uptime calculation
    pub started_at: std::time::Instant,
}

impl AppState {
    pub fn new(notes: NotesService, config: Config) -> Self {
        Self {
            notes,
            config,
            started_at: std::time::Instant::now(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::MemoryStateStore;
    use crate::models::NotesConfig;
    use crate::workspace::Workspace;
    use std::path::PathBuf;

    /// App state over an empty in-memory store
    pub fn test_state() -> (AppState, MemoryStateStore) {
        let store = MemoryStateStore::new();
        let ws = Workspace::open(Box::new(store.clone()), NotesConfig::default()).unwrap();
        let config = Config {
            port: config::defaults::PORT,
            data_dir: PathBuf::from("."),
            db_file: config::defaults::DB_FILE.to_string(),
            frontend_dist: None,
        };
        (AppState::new(NotesService::new(ws), config), store)
    }
}
