//! Tunables for the notes core backed by a RON file.
//!
//! Loaded from `<data dir>/notes_config.ron`; every field falls back to its
//! default so a partial file is fine.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotesConfig {
    /// Quiet period after the last edit before an autosave flush
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
    /// Relevance weight of a title match
    #[serde(default = "default_title_boost")]
    pub title_boost: f64,
    /// Relevance weight of a content match
    #[serde(default = "default_content_boost")]
    pub content_boost: f64,
    /// Key of the application state blob in the persistent store
    #[serde(default = "default_store_key")]
    pub store_key: String,
    /// Extra attempts after a failed save before the failure is surfaced
    #[serde(default = "default_save_retries")]
    pub save_retries: u32,
}

fn default_autosave_delay_ms() -> u64 { 500 }
fn default_title_boost() -> f64 { 10.0 }
fn default_content_boost() -> f64 { 1.0 }
fn default_store_key() -> String { "markdown-notes-app".to_string() }
fn default_save_retries() -> u32 { 1 }

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: default_autosave_delay_ms(),
            title_boost: default_title_boost(),
            content_boost: default_content_boost(),
            store_key: default_store_key(),
            save_retries: default_save_retries(),
        }
    }
}

impl NotesConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Load from `path`, falling back to `Default` on any error.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match ron::from_str::<NotesConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::debug!("Could not read {} ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = NotesConfig::load(&dir.path().join("nope.ron"));
        assert_eq!(config, NotesConfig::default());
        assert_eq!(config.autosave_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes_config.ron");
        std::fs::write(&path, "(autosave_delay_ms: 250)").unwrap();

        let config = NotesConfig::load(&path);
        assert_eq!(config.autosave_delay_ms, 250);
        assert_eq!(config.title_boost, 10.0);
        assert_eq!(config.store_key, "markdown-notes-app");
    }

    #[test]
    fn test_full_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes_config.ron");
        std::fs::write(
            &path,
            r#"(
                autosave_delay_ms: 800,
                title_boost: 5.0,
                content_boost: 2.0,
                store_key: "work-notes",
                save_retries: 3,
            )"#,
        )
        .unwrap();

        let config = NotesConfig::load(&path);
        assert_eq!(config.autosave_delay(), Duration::from_millis(800));
        assert_eq!(config.content_boost, 2.0);
        assert_eq!(config.store_key, "work-notes");
        assert_eq!(config.save_retries, 3);
    }

    #[test]
    fn test_garbage_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes_config.ron");
        std::fs::write(&path, "not ron at all {").unwrap();
        assert_eq!(NotesConfig::load(&path), NotesConfig::default());
    }
}
