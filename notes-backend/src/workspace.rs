//! Workspace: the single owner of the notes application state.
//!
//! Every mutation goes through this type. Edits are debounced through the
//! autosave coordinator; discrete actions (create, select, delete, import)
//! cancel any pending autosave and flush right away.

use notes_types::{
    ApplicationState, EditField, ImportResult, Note, NoteId, NotesEvent, Prefs, Theme,
};
use std::time::Instant;
use tokio::sync::broadcast;

use crate::autosave::AutosaveCoordinator;
use crate::db::StateStore;
use crate::error::{NotesError, NotesResult};
use crate::models::NotesConfig;
use crate::notes::backup::{self, ExportDocument};
use crate::notes::query;
use crate::notes::{NoteRepository, SearchIndex};

const EVENT_CAPACITY: usize = 64;

/// What a flush did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub persisted: bool,
    pub indexed: usize,
    /// Notes whose list entries were refreshed
    pub refreshed: Vec<NoteId>,
}

pub struct Workspace {
    repo: NoteRepository,
    index: SearchIndex,
    store: Box<dyn StateStore>,
    autosave: AutosaveCoordinator,
    prefs: Prefs,
    config: NotesConfig,
    persistence_error: Option<String>,
    events: broadcast::Sender<NotesEvent>,
}

impl Workspace {
    /// Load the stored state and build the index.
    ///
    /// A stored document that is not JSON at all is an error rather than
    /// an empty workspace, so the next save cannot overwrite it.
    pub fn open(store: Box<dyn StateStore>, config: NotesConfig) -> NotesResult<Self> {
        let state = match store.load()? {
            Some(raw) => {
                let value: serde_json::Value = serde_json::from_str(&raw)?;
                backup::merge_with_defaults(&value)
            }
            None => ApplicationState::default(),
        };

        let mut repo = NoteRepository::from_parts(state.notes, state.active_note_id);
        repo.ensure_default_active();

        let mut index = SearchIndex::new(config.title_boost, config.content_boost)?;
        index.rebuild(&repo.list_sorted())?;

        log::info!(
            "[NOTES] Loaded {} notes (active: {})",
            repo.len(),
            repo.active_note_id().unwrap_or("none")
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            repo,
            index,
            store,
            autosave: AutosaveCoordinator::new(config.autosave_delay()),
            prefs: Prefs {
                theme: state.theme,
                sidebar_collapsed: state.sidebar_collapsed,
            },
            config,
            persistence_error: None,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotesEvent> {
        self.events.subscribe()
    }

    // --- Reads ---

    pub fn current_list(&self) -> Vec<Note> {
        self.repo.list_sorted()
    }

    pub fn active_note(&self) -> Option<Note> {
        self.repo.active_note().cloned()
    }

    pub fn find(&self, id: &str) -> Option<Note> {
        self.repo.find(id).cloned()
    }

    pub fn prefs(&self) -> Prefs {
        self.prefs
    }

    /// Last save failure that has not been followed by a successful save
    pub fn persistence_error(&self) -> Option<&str> {
        self.persistence_error.as_deref()
    }

    /// Search the index. Blank or malformed queries give the full list.
    pub fn search_results(&self, query: &str) -> Vec<Note> {
        if query.trim().is_empty() {
            return self.repo.list_sorted();
        }

        let parsed = match query::parse(query) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("[SEARCH] {}; showing all notes", e);
                return self.repo.list_sorted();
            }
        };

        match self.index.search(&parsed) {
            Ok(ids) => ids
                .iter()
                .filter_map(|id| self.repo.find(id).cloned())
                .collect(),
            Err(e) => {
                log::warn!("[SEARCH] Query '{}' failed: {}; showing all notes", query, e);
                self.repo.list_sorted()
            }
        }
    }

    pub fn snapshot(&self) -> ApplicationState {
        ApplicationState {
            notes: self.repo.notes().to_vec(),
            active_note_id: self.repo.active_note_id().map(str::to_string),
            theme: self.prefs.theme,
            sidebar_collapsed: self.prefs.sidebar_collapsed,
        }
    }

    // --- Editor events ---

    /// Apply an editor change. Unchanged values do nothing; real changes
    /// arm (or push back) the autosave timer.
    pub fn edit(&mut self, id: &str, field: EditField, value: &str, now: Instant) -> NotesResult<bool> {
        let changed = self.repo.update(id, field, value)?;
        if changed {
            let deadline = self.autosave.on_edit(id, now);
            log::trace!(
                "[AUTOSAVE] {} of {} changed, flush in {:?}",
                field,
                id,
                deadline.saturating_duration_since(now)
            );
        }
        Ok(changed)
    }

    pub fn next_autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Flush if the autosave deadline has passed.
    pub fn poll_autosave(&mut self, now: Instant) -> Option<FlushReport> {
        let edited = self.autosave.take_due(now)?;
        Some(self.flush(edited))
    }

    /// Flush whatever is pending right now (shutdown).
    pub fn flush_pending(&mut self) -> Option<FlushReport> {
        let edited = self.autosave.cancel()?;
        Some(self.flush(edited))
    }

    // --- Discrete actions ---

    pub fn create(&mut self) -> Note {
        let edited = self.autosave.cancel().unwrap_or_default();
        let note = self.repo.create();
        self.flush(edited);
        self.emit_list_changed();
        note
    }

    pub fn select(&mut self, id: &str) -> Option<Note> {
        let edited = self.autosave.cancel().unwrap_or_default();
        self.repo.set_active(Some(id));
        self.flush(edited);
        self.emit_list_changed();
        self.active_note()
    }

    /// Remove a note. The confirmation prompt belongs to the caller.
    pub fn delete(&mut self, id: &str) -> bool {
        if self.repo.find(id).is_none() {
            return false;
        }
        let edited = self.autosave.cancel().unwrap_or_default();
        self.repo.delete(id);
        log::info!("[NOTES] Deleted {}", id);
        self.flush(edited);
        self.emit_list_changed();
        true
    }

    pub fn toggle_favorite(&mut self, id: &str) -> NotesResult<bool> {
        let favorite = self.repo.toggle_favorite(id)?;
        let _ = self.persist();
        Ok(favorite)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.prefs.theme = self.prefs.theme.toggled();
        let _ = self.persist();
        self.prefs.theme
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.prefs.sidebar_collapsed = !self.prefs.sidebar_collapsed;
        let _ = self.persist();
        self.prefs.sidebar_collapsed
    }

    // --- Import / export ---

    pub fn export(&self) -> NotesResult<ExportDocument> {
        backup::export(&self.snapshot(), chrono::Utc::now().timestamp_millis())
    }

    /// Validate and apply an import document. Invalid documents leave the
    /// workspace untouched.
    pub fn import(&mut self, raw: &str) -> NotesResult<ImportResult> {
        let state = backup::parse_import(raw)?;
        Ok(self.replace_state(state))
    }

    /// Replace the whole application state with an already validated one.
    pub fn replace_state(&mut self, state: ApplicationState) -> ImportResult {
        // Pending edits belong to the state being replaced
        self.autosave.cancel();
        self.repo.replace_all(state.notes, state.active_note_id);
        self.prefs = Prefs {
            theme: state.theme,
            sidebar_collapsed: state.sidebar_collapsed,
        };
        self.flush(Vec::new());
        self.emit_list_changed();

        log::info!("[NOTES] Imported {} notes", self.repo.len());
        ImportResult {
            imported_notes: self.repo.len(),
            active_note_id: self.repo.active_note_id().map(str::to_string),
        }
    }

    // --- Flush ---

    /// Persist, rebuild the index, and refresh the list entries of `edited`.
    fn flush(&mut self, edited: Vec<NoteId>) -> FlushReport {
        let persisted = self.persist().is_ok();

        let indexed = match self.index.rebuild(&self.repo.list_sorted()) {
            Ok(n) => n,
            Err(e) => {
                log::error!("[SEARCH] Failed to rebuild index: {}", e);
                0
            }
        };

        let mut refreshed = Vec::with_capacity(edited.len());
        for id in edited {
            if let Some(note) = self.repo.find(&id) {
                let _ = self.events.send(NotesEvent::ListEntryUpdated {
                    id: note.id.clone(),
                    title: note.title.clone(),
                    updated_at: note.updated_at,
                });
                refreshed.push(id);
            }
        }

        FlushReport {
            persisted,
            indexed,
            refreshed,
        }
    }

    /// Save the whole state, retrying before giving up. A failure is logged,
    /// kept for `persistence_error()` and broadcast; memory stays as is.
    fn persist(&mut self) -> NotesResult<()> {
        let raw = serde_json::to_string(&self.snapshot())?;
        let attempts = self.config.save_retries + 1;

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match self.store.save(&raw) {
                Ok(()) => {
                    if self.persistence_error.take().is_some() {
                        log::info!("[STORE] Save recovered");
                    }
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("[STORE] Save attempt {} of {} failed: {}", attempt, attempts, e);
                    last_error = e.to_string();
                }
            }
        }

        log::error!("[STORE] Giving up on save: {}", last_error);
        self.persistence_error = Some(last_error.clone());
        let _ = self.events.send(NotesEvent::PersistenceFailed {
            error: last_error.clone(),
        });
        Err(NotesError::PersistenceWriteFailure(last_error))
    }

    fn emit_list_changed(&self) {
        let _ = self.events.send(NotesEvent::ListChanged {
            active_note_id: self.repo.active_note_id().map(str::to_string),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStateStore;
    use serde_json::json;
    use std::time::Duration;

    fn open(store: &MemoryStateStore) -> Workspace {
        Workspace::open(Box::new(store.clone()), NotesConfig::default()).unwrap()
    }

    fn seeded_store() -> MemoryStateStore {
        MemoryStateStore::with_value(
            json!({
                "notes": [
                    {"id": "shop", "title": "Shopping", "content": "milk eggs",
                     "createdAt": 1, "updatedAt": 20, "favorite": false},
                    {"id": "work", "title": "Work", "content": "meeting notes",
                     "createdAt": 1, "updatedAt": 10, "favorite": false}
                ],
                "theme": "dark"
            })
            .to_string(),
        )
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_open_empty_store() {
        let ws = open(&MemoryStateStore::new());
        assert!(ws.current_list().is_empty());
        assert!(ws.active_note().is_none());
        assert_eq!(ws.prefs().theme, Theme::Light);
    }

    #[test]
    fn test_open_merges_and_selects_most_recent() {
        let store = MemoryStateStore::with_value(
            json!({
                "notes": [
                    {"id": "older", "updatedAt": 1},
                    {"id": "newer", "updatedAt": 5}
                ],
                "sidebarCollapsed": true
            })
            .to_string(),
        );
        let ws = open(&store);
        assert_eq!(ws.active_note().unwrap().id, "newer");
        assert!(ws.prefs().sidebar_collapsed);
        assert_eq!(ws.prefs().theme, Theme::Light);
    }

    #[test]
    fn test_open_refuses_unparsable_state() {
        let store = MemoryStateStore::with_value("{{{ not json");
        let result = Workspace::open(Box::new(store), NotesConfig::default());
        assert!(matches!(result, Err(NotesError::Serialization(_))));
    }

    #[test]
    fn test_unreadable_stored_note_does_not_wipe_the_rest() {
        let store = MemoryStateStore::with_value(
            json!({
                "notes": [
                    {"id": "a", "title": "Keep", "content": "precious",
                     "createdAt": 1, "updatedAt": 2, "favorite": false},
                    null
                ]
            })
            .to_string(),
        );
        let mut ws = open(&store);
        assert_eq!(ids(&ws.current_list()), vec!["a"]);

        ws.create();
        assert_eq!(ws.current_list().len(), 2);
        assert!(store.raw().unwrap().contains("precious"));
    }

    #[test]
    fn test_create_flushes_immediately() {
        let store = MemoryStateStore::new();
        let mut ws = open(&store);

        let note = ws.create();
        assert_eq!(store.save_count(), 1);
        assert_eq!(ws.active_note().unwrap().id, note.id);
        assert!(store.raw().unwrap().contains(&note.id));
        assert_eq!(ids(&ws.search_results("untitled")), vec![note.id.as_str()]);
    }

    #[test]
    fn test_noop_edit_does_not_schedule() {
        let store = seeded_store();
        let mut ws = open(&store);
        let now = Instant::now();

        let changed = ws.edit("shop", EditField::Content, "milk eggs", now).unwrap();
        assert!(!changed);
        assert!(!ws.autosave_pending());
        assert_eq!(ws.find("shop").unwrap().updated_at, 20);
        assert!(ws.poll_autosave(now + Duration::from_secs(5)).is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_edit_flushes_after_quiet_period() {
        let store = seeded_store();
        let mut ws = open(&store);
        let mut events = ws.subscribe();
        let t0 = Instant::now();

        assert!(ws.edit("work", EditField::Content, "standup", t0).unwrap());
        assert!(ws.edit("work", EditField::Title, "Work log", t0 + Duration::from_millis(100)).unwrap());

        // Index is a cache; it catches up on flush
        assert!(ws.search_results("standup").is_empty());
        assert!(ws.poll_autosave(t0 + Duration::from_millis(599)).is_none());
        assert_eq!(store.save_count(), 0);

        let report = ws.poll_autosave(t0 + Duration::from_millis(600)).unwrap();
        assert!(report.persisted);
        assert_eq!(report.indexed, 2);
        assert_eq!(report.refreshed, vec!["work".to_string()]);
        assert_eq!(store.save_count(), 1);
        assert_eq!(ids(&ws.search_results("standup")), vec!["work"]);

        match events.try_recv().unwrap() {
            NotesEvent::ListEntryUpdated { id, title, .. } => {
                assert_eq!(id, "work");
                assert_eq!(title, "Work log");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_select_cancels_pending_and_flushes() {
        let store = seeded_store();
        let mut ws = open(&store);
        let t0 = Instant::now();

        ws.edit("shop", EditField::Content, "bread", t0).unwrap();
        assert!(ws.autosave_pending());

        let active = ws.select("work").unwrap();
        assert_eq!(active.id, "work");
        assert!(!ws.autosave_pending());
        assert_eq!(store.save_count(), 1);
        assert!(store.raw().unwrap().contains("bread"));
        assert!(ws.poll_autosave(t0 + Duration::from_secs(1)).is_none());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_select_unknown_clears_active() {
        let mut ws = open(&seeded_store());
        assert!(ws.select("ghost").is_none());
        assert!(ws.active_note().is_none());
    }

    #[test]
    fn test_delete_active_clears_and_persists() {
        let store = seeded_store();
        let mut ws = open(&store);
        assert_eq!(ws.active_note().unwrap().id, "shop");

        assert!(ws.delete("shop"));
        assert!(ws.active_note().is_none());
        assert_eq!(ids(&ws.current_list()), vec!["work"]);
        assert!(!store.raw().unwrap().contains("milk"));
        assert!(ws.search_results("milk").is_empty());

        assert!(!ws.delete("shop"));
    }

    #[test]
    fn test_search_contract() {
        let mut ws = open(&seeded_store());

        assert_eq!(ids(&ws.search_results("milk")), vec!["shop"]);
        assert_eq!(ids(&ws.search_results("")), vec!["shop", "work"]);
        assert_eq!(ids(&ws.search_results("   ")), vec!["shop", "work"]);
        assert!(ws.search_results("zebra").is_empty());

        for malformed in ["milk:", "title:", "milk^", "+", "author:me"] {
            assert_eq!(ids(&ws.search_results(malformed)), vec!["shop", "work"]);
        }

        // Results resolve against the repository, never the stale index copy
        ws.delete("shop");
        assert!(ws.search_results("milk").is_empty());
    }

    #[test]
    fn test_export_import_round_trip() {
        let store = seeded_store();
        let mut ws = open(&store);
        ws.toggle_favorite("work").unwrap();
        ws.toggle_sidebar();
        ws.select("work");

        let doc = ws.export().unwrap();
        assert!(doc.file_name.starts_with("markdown-notes-backup-"));

        let fresh_store = MemoryStateStore::new();
        let mut fresh = open(&fresh_store);
        let result = fresh.import(&doc.body).unwrap();
        assert_eq!(result.imported_notes, 2);

        assert_eq!(fresh.snapshot(), ws.snapshot());
        assert_eq!(fresh.active_note().unwrap().id, "work");
        assert_eq!(fresh_store.save_count(), 1);
    }

    #[test]
    fn test_round_trip_keeps_null_active() {
        let mut ws = open(&seeded_store());
        ws.delete("shop");
        assert!(ws.active_note().is_none());

        let doc = ws.export().unwrap();
        let mut fresh = open(&MemoryStateStore::new());
        fresh.import(&doc.body).unwrap();
        assert!(fresh.active_note().is_none());
        assert_eq!(fresh.snapshot(), ws.snapshot());
    }

    #[test]
    fn test_malformed_import_changes_nothing() {
        let store = seeded_store();
        let mut ws = open(&store);
        ws.toggle_theme();
        let raw_before = store.raw().unwrap();
        let snapshot_before = ws.snapshot();
        let saves_before = store.save_count();

        let err = ws.import(r#"{"theme":"light","activeNoteId":null}"#).unwrap_err();
        assert!(matches!(err, NotesError::MalformedImport(_)));

        assert_eq!(store.raw().unwrap(), raw_before);
        assert_eq!(store.save_count(), saves_before);
        assert_eq!(ws.snapshot(), snapshot_before);
    }

    #[test]
    fn test_import_cancels_pending_edit() {
        let mut ws = open(&seeded_store());
        ws.edit("shop", EditField::Title, "Groceries", Instant::now()).unwrap();

        ws.import(r#"{"notes":[{"id":"only","title":"Only"}]}"#).unwrap();
        assert!(!ws.autosave_pending());
        assert_eq!(ids(&ws.current_list()), vec!["only"]);
        assert!(ws.active_note().is_none());
        assert_eq!(ws.prefs().theme, Theme::Light);
    }

    #[test]
    fn test_save_retries_once_before_failing() {
        let store = seeded_store();
        let mut ws = open(&store);

        store.fail_next_saves(1);
        ws.toggle_theme();
        assert!(ws.persistence_error().is_none());
        assert_eq!(store.save_count(), 1);

        let mut events = ws.subscribe();
        store.fail_next_saves(2);
        let note = ws.create();
        assert!(ws.persistence_error().is_some());
        // Memory keeps the change even though the store did not
        assert!(ws.find(&note.id).is_some());
        assert!(!store.raw().unwrap().contains(&note.id));
        assert!(matches!(
            events.try_recv().unwrap(),
            NotesEvent::PersistenceFailed { .. }
        ));

        ws.toggle_sidebar();
        assert!(ws.persistence_error().is_none());
        assert!(store.raw().unwrap().contains(&note.id));
    }

    #[test]
    fn test_prefs_persist() {
        let store = MemoryStateStore::new();
        let mut ws = open(&store);
        assert_eq!(ws.toggle_theme(), Theme::Dark);
        assert!(ws.toggle_sidebar());

        let reopened = open(&store);
        assert_eq!(reopened.prefs().theme, Theme::Dark);
        assert!(reopened.prefs().sidebar_collapsed);
    }

    #[test]
    fn test_flush_pending_on_shutdown() {
        let store = seeded_store();
        let mut ws = open(&store);
        assert!(ws.flush_pending().is_none());

        ws.edit("work", EditField::Content, "late edit", Instant::now()).unwrap();
        let report = ws.flush_pending().unwrap();
        assert!(report.persisted);
        assert!(store.raw().unwrap().contains("late edit"));
    }
}
