//! Shared types for the notes backend and its HTTP/WebSocket clients.
//!
//! Field names serialize in camelCase so backups written by the browser
//! version of the app load unchanged.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Opaque note identifier (`note-<uuid>` for notes created here).
pub type NoteId = String;

// =====================================================
// Domain Types
// =====================================================

/// A titled markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    /// Markdown source
    #[serde(default)]
    pub content: String,
    /// Unix epoch milliseconds
    #[serde(default)]
    pub created_at: i64,
    /// Unix epoch milliseconds; the display sort key
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub favorite: bool,
}

impl Note {
    pub fn field(&self, field: EditField) -> &str {
        match field {
            EditField::Title => &self.title,
            EditField::Content => &self.content,
        }
    }
}

/// UI color theme.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// The editable text fields of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EditField {
    Title,
    Content,
}

/// Everything that gets persisted: notes plus UI preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationState {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub active_note_id: Option<NoteId>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub sidebar_collapsed: bool,
}

/// UI preferences as exposed to the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prefs {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
}

// =====================================================
// RPC Request Types
// =====================================================

/// An editor change to one field of a note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    pub field: EditField,
    pub value: String,
}

/// Query string for search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Confirmation flag for destructive actions (delete, import)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the last save to the persistent store failed after retrying
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            persistence_error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
            persistence_error: None,
        }
    }

    pub fn with_persistence_error(mut self, err: Option<String>) -> Self {
        self.persistence_error = err;
        self
    }
}

/// Result of an edit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResult {
    /// False when the value was identical and nothing was scheduled
    pub changed: bool,
    pub note: Note,
}

/// Result of an import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported_notes: usize,
    pub active_note_id: Option<NoteId>,
}

// =====================================================
// Push Events
// =====================================================

/// Events pushed to connected frontends over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotesEvent {
    /// A single list entry changed after an autosave flush
    ListEntryUpdated {
        id: NoteId,
        title: String,
        updated_at: i64,
    },
    /// The list as a whole changed (create, delete, import, select)
    ListChanged {
        active_note_id: Option<NoteId>,
    },
    /// Saving to the persistent store failed after retrying
    PersistenceFailed { error: String },
}
