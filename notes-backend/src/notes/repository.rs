//! In-memory note collection and the active-note pointer.
//!
//! All note mutation goes through here so that no-op edits never bump
//! `updated_at` and the active id never dangles.

use notes_types::{EditField, Note, NoteId};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{NotesError, NotesResult};

pub const DEFAULT_TITLE: &str = "Untitled Note";
pub const DEFAULT_CONTENT: &str = "# New Note\n\nStart writing!";

/// Source of "now" in epoch milliseconds
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

pub struct NoteRepository {
    /// Stored order; newest creations first
    notes: Vec<Note>,
    active_note_id: Option<NoteId>,
    clock: Clock,
}

impl Default for NoteRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteRepository {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            active_note_id: None,
            clock: system_clock(),
        }
    }

    /// Build from loaded notes. Later duplicates of an id are dropped and a
    /// stale active id is cleared.
    pub fn from_parts(notes: Vec<Note>, active_note_id: Option<NoteId>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(notes.len());
        for note in notes {
            if seen.insert(note.id.clone()) {
                kept.push(note);
            } else {
                log::warn!("[NOTES] Dropping duplicate note id {}", note.id);
            }
        }

        let mut repo = Self {
            notes: kept,
            active_note_id: None,
            clock: system_clock(),
        };
        repo.set_active(active_note_id.as_deref());
        repo
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Swap in a whole new collection, keeping the clock.
    pub fn replace_all(&mut self, notes: Vec<Note>, active_note_id: Option<NoteId>) {
        let clock = Arc::clone(&self.clock);
        *self = Self::from_parts(notes, active_note_id).with_clock(clock);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn active_note_id(&self) -> Option<&str> {
        self.active_note_id.as_deref()
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.active_note_id.as_deref().and_then(|id| self.find(id))
    }

    /// Create a note at the front of the collection and make it active.
    pub fn create(&mut self) -> Note {
        let now = (self.clock)();
        let note = Note {
            id: self.fresh_id(),
            title: DEFAULT_TITLE.to_string(),
            content: DEFAULT_CONTENT.to_string(),
            created_at: now,
            updated_at: now,
            favorite: false,
        };
        self.notes.insert(0, note.clone());
        self.active_note_id = Some(note.id.clone());
        log::debug!("[NOTES] Created {}", note.id);
        note
    }

    pub fn find(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Set one field of a note. Returns `false` (and touches nothing) when
    /// the value is unchanged.
    pub fn update(&mut self, id: &str, field: EditField, value: &str) -> NotesResult<bool> {
        let now = (self.clock)();
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| NotesError::NoteNotFound(id.to_string()))?;

        if note.field(field) == value {
            return Ok(false);
        }

        match field {
            EditField::Title => note.title = value.to_string(),
            EditField::Content => note.content = value.to_string(),
        }
        note.updated_at = note.updated_at.max(now);
        Ok(true)
    }

    /// Flip the favorite flag. Not a content change, so `updated_at` stays.
    pub fn toggle_favorite(&mut self, id: &str) -> NotesResult<bool> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| NotesError::NoteNotFound(id.to_string()))?;
        note.favorite = !note.favorite;
        Ok(note.favorite)
    }

    /// Remove a note. Confirmation is the caller's job.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        let removed = self.notes.len() != before;
        if removed && self.active_note_id.as_deref() == Some(id) {
            self.active_note_id = None;
        }
        removed
    }

    /// Notes by `updated_at` descending. The sort is stable, so equal
    /// timestamps keep their stored order.
    pub fn list_sorted(&self) -> Vec<Note> {
        let mut sorted = self.notes.clone();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sorted
    }

    /// Point the editor at a note. Unknown ids clear the selection.
    pub fn set_active(&mut self, id: Option<&str>) {
        self.active_note_id = match id {
            Some(id) if self.find(id).is_some() => Some(id.to_string()),
            Some(id) => {
                log::debug!("[NOTES] Ignoring stale active id {}", id);
                None
            }
            None => None,
        };
    }

    /// With nothing selected, select the most recently updated note.
    pub fn ensure_default_active(&mut self) {
        if self.active_note_id.is_some() {
            return;
        }
        // Ties go to the earlier stored note, matching `list_sorted()[0]`.
        let most_recent = self
            .notes
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.updated_at.cmp(&b.updated_at).then(ib.cmp(ia)))
            .map(|(_, n)| n.id.clone());
        self.active_note_id = most_recent;
    }

    fn fresh_id(&self) -> NoteId {
        loop {
            let id = format!("note-{}", uuid::Uuid::new_v4());
            if self.find(&id).is_none() {
                return id;
            }
        }
    }
}
