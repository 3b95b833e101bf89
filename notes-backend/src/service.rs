//! Shared handle to the workspace.
//!
//! One lock serializes HTTP handlers and the autosave task, so the
//! persistent store is never written concurrently.

use notes_types::{EditField, EditResult, NotesEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};

use crate::error::{NotesError, NotesResult};
use crate::workspace::Workspace;

#[derive(Clone)]
pub struct NotesService {
    workspace: Arc<Mutex<Workspace>>,
    rearm: Arc<Notify>,
}

impl NotesService {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace: Arc::new(Mutex::new(workspace)),
            rearm: Arc::new(Notify::new()),
        }
    }

    /// Run `f` with exclusive access to the workspace.
    pub fn with<R>(&self, f: impl FnOnce(&mut Workspace) -> R) -> R {
        let mut ws = self.workspace.lock();
        f(&mut ws)
    }

    pub(crate) fn rearm_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.rearm)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotesEvent> {
        self.with(|ws| ws.subscribe())
    }

    /// Apply an editor change and wake the autosave task if it armed the timer.
    pub fn edit(&self, id: &str, field: EditField, value: &str) -> NotesResult<EditResult> {
        let now = tokio::time::Instant::now().into_std();
        let (changed, note) = self.with(|ws| {
            let changed = ws.edit(id, field, value, now)?;
            let note = ws
                .find(id)
                .ok_or_else(|| NotesError::NoteNotFound(id.to_string()))?;
            Ok::<_, NotesError>((changed, note))
        })?;

        if changed {
            self.rearm.notify_one();
        }
        Ok(EditResult { changed, note })
    }

    /// Flush a pending autosave before exit.
    pub fn shutdown(&self) {
        if let Some(report) = self.with(|ws| ws.flush_pending()) {
            log::info!(
                "[AUTOSAVE] Final flush on shutdown (persisted: {})",
                report.persisted
            );
        }
    }
}
