//! Backup documents: export, import validation and load-time merging.
//!
//! A backup is the full application state as pretty JSON, the same shape the
//! persistent store holds.

use notes_types::{ApplicationState, Note, Theme};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{NotesError, NotesResult};

/// A ready-to-download export
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub file_name: String,
    pub body: String,
}

/// `markdown-notes-backup-<epoch millis>.json`
pub fn export_file_name(now_ms: i64) -> String {
    format!("markdown-notes-backup-{}.json", now_ms)
}

pub fn export(state: &ApplicationState, now_ms: i64) -> NotesResult<ExportDocument> {
    Ok(ExportDocument {
        file_name: export_file_name(now_ms),
        body: serde_json::to_string_pretty(state)?,
    })
}

/// Validate an import document. `notes` must be an array of notes with
/// distinct ids; `null` entries are skipped. Preferences that are missing or
/// unreadable take defaults and an active id that names no imported note is
/// dropped.
pub fn parse_import(raw: &str) -> NotesResult<ApplicationState> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| NotesError::MalformedImport(format!("not valid JSON ({})", e)))?;
    let obj = value
        .as_object()
        .ok_or_else(|| NotesError::MalformedImport("document is not an object".to_string()))?;

    let notes_value = obj
        .get("notes")
        .ok_or_else(|| NotesError::MalformedImport("missing 'notes'".to_string()))?;
    let items = notes_value
        .as_array()
        .ok_or_else(|| NotesError::MalformedImport("'notes' is not a list".to_string()))?;

    let mut notes = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        if item.is_null() {
            log::debug!("[BACKUP] Skipping empty note entry {}", i);
            continue;
        }
        let note: Note = serde_json::from_value(item.clone())
            .map_err(|e| NotesError::MalformedImport(format!("note {}: {}", i, e)))?;
        if !seen.insert(note.id.clone()) {
            return Err(NotesError::MalformedImport(format!(
                "duplicate note id '{}'",
                note.id
            )));
        }
        notes.push(note);
    }

    let mut state = merge_prefs(obj);
    state.active_note_id = state.active_note_id.filter(|id| seen.contains(id));
    state.notes = notes;
    Ok(state)
}

/// Merge a stored document over the defaults field by field. A field that
/// is missing or has the wrong shape keeps its default. Notes are read one
/// by one so a single unreadable entry never costs the others.
pub fn merge_with_defaults(value: &Value) -> ApplicationState {
    let Some(obj) = value.as_object() else {
        log::warn!("[STORE] Stored state is not an object, starting empty");
        return ApplicationState::default();
    };

    let mut state = merge_prefs(obj);
    match obj.get("notes") {
        Some(Value::Array(items)) => {
            state.notes = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    if item.is_null() {
                        return None;
                    }
                    match serde_json::from_value::<Note>(item.clone()) {
                        Ok(note) => Some(note),
                        Err(e) => {
                            log::warn!("[STORE] Skipping unreadable stored note {}: {}", i, e);
                            None
                        }
                    }
                })
                .collect();
        }
        Some(other) => log::warn!("[STORE] Ignoring stored notes that are not a list: {}", other),
        None => {}
    }
    state
}

fn merge_prefs(obj: &Map<String, Value>) -> ApplicationState {
    let mut state = ApplicationState::default();
    if let Some(id) = obj.get("activeNoteId").and_then(Value::as_str) {
        state.active_note_id = Some(id.to_string());
    }
    if let Some(theme) = obj.get("theme") {
        match serde_json::from_value::<Theme>(theme.clone()) {
            Ok(theme) => state.theme = theme,
            Err(_) => log::debug!("[STORE] Unknown theme {}, using default", theme),
        }
    }
    if let Some(collapsed) = obj.get("sidebarCollapsed").and_then(Value::as_bool) {
        state.sidebar_collapsed = collapsed;
    }
    state
}

/// Write a backup file (creates parent directories as needed)
pub fn write_backup(path: &Path, body: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(body.as_bytes())?;
    Ok(())
}

pub fn read_backup(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_state() -> ApplicationState {
        ApplicationState {
            notes: vec![
                Note {
                    id: "note-a".to_string(),
                    title: "Shopping".to_string(),
                    content: "milk eggs".to_string(),
                    created_at: 100,
                    updated_at: 200,
                    favorite: true,
                },
                Note {
                    id: "note-b".to_string(),
                    title: "Work".to_string(),
                    content: "meeting notes".to_string(),
                    created_at: 50,
                    updated_at: 60,
                    favorite: false,
                },
            ],
            active_note_id: Some("note-b".to_string()),
            theme: Theme::Dark,
            sidebar_collapsed: true,
        }
    }

    #[test]
    fn test_export_name() {
        assert_eq!(export_file_name(1700000000000), "markdown-notes-backup-1700000000000.json");
    }

    #[test]
    fn test_export_then_import() {
        let state = sample_state();
        let doc = export(&state, 1).unwrap();
        assert!(doc.body.contains("\"activeNoteId\": \"note-b\""));
        assert_eq!(parse_import(&doc.body).unwrap(), state);
    }

    #[test]
    fn test_import_rejects_bad_shapes() {
        let cases = [
            "not json",
            "[]",
            r#"{"theme":"dark"}"#,
            r#"{"notes":{"a":1}}"#,
            r#"{"notes":[{"title":"no id"}]}"#,
            r#"{"notes":[{"id":"x"},{"id":"x"}]}"#,
        ];
        for raw in cases {
            let err = parse_import(raw).unwrap_err();
            assert!(matches!(err, NotesError::MalformedImport(_)), "{}", raw);
        }
    }

    #[test]
    fn test_import_skips_null_entries() {
        let raw = json!({
            "notes": [null, {"id": "n1", "title": "Kept"}, null],
            "activeNoteId": "n1"
        })
        .to_string();
        let state = parse_import(&raw).unwrap();
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].title, "Kept");
        assert_eq!(state.active_note_id.as_deref(), Some("n1"));

        let err = parse_import(r#"{"notes":[null,{"id":"x"},{"id":"x"}]}"#).unwrap_err();
        assert!(matches!(err, NotesError::MalformedImport(_)));
    }

    #[test]
    fn test_import_fills_defaults_and_drops_stale_active() {
        let raw = json!({
            "notes": [{"id": "n1", "title": "Only"}],
            "activeNoteId": "gone",
            "theme": "sepia"
        })
        .to_string();
        let state = parse_import(&raw).unwrap();
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].content, "");
        assert!(state.active_note_id.is_none());
        assert_eq!(state.theme, Theme::Light);
        assert!(!state.sidebar_collapsed);
    }

    #[test]
    fn test_merge_with_defaults_partial() {
        let merged = merge_with_defaults(&json!({ "sidebarCollapsed": true }));
        assert!(merged.sidebar_collapsed);
        assert!(merged.notes.is_empty());
        assert_eq!(merged.theme, Theme::Light);

        let merged = merge_with_defaults(&json!({ "notes": "oops", "theme": "dark" }));
        assert!(merged.notes.is_empty());
        assert_eq!(merged.theme, Theme::Dark);

        assert_eq!(merge_with_defaults(&json!(42)), ApplicationState::default());
    }

    #[test]
    fn test_merge_keeps_readable_notes() {
        let merged = merge_with_defaults(&json!({
            "notes": [
                {"id": "a", "content": "precious"},
                null,
                {"title": "no id"},
                7,
                {"id": "b"}
            ]
        }));
        let ids: Vec<&str> = merged.notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(merged.notes[0].content, "precious");
    }

    #[test]
    fn test_write_and_read_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("backup.json");
        write_backup(&path, "{\"notes\":[]}").unwrap();
        assert_eq!(read_backup(&path).unwrap(), "{\"notes\":[]}");
    }
}
