//! Debounce state machine for editor autosave
//!
//! Edits arm a single deadline; every further edit pushes it back. Once the
//! deadline passes with no new edit the batch is handed out for flushing.
//! Time is passed in so the machine itself never sleeps.

use notes_types::NoteId;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveState {
    Idle,
    PendingFlush {
        deadline: Instant,
        /// Notes edited since the last flush, in first-edit order
        notes: Vec<NoteId>,
    },
}

/// Owns the one live autosave timer of the editing session.
#[derive(Debug)]
pub struct AutosaveCoordinator {
    delay: Duration,
    state: AutosaveState,
}

impl AutosaveCoordinator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: AutosaveState::Idle,
        }
    }

    pub fn state(&self) -> &AutosaveState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, AutosaveState::PendingFlush { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            AutosaveState::PendingFlush { deadline, .. } => Some(*deadline),
            AutosaveState::Idle => None,
        }
    }

    /// Record a title or content edit and (re)arm the timer. Returns the new
    /// deadline.
    pub fn on_edit(&mut self, note_id: &str, now: Instant) -> Instant {
        let deadline = now + self.delay;
        if let AutosaveState::PendingFlush {
            deadline: pending,
            notes,
        } = &mut self.state
        {
            *pending = deadline;
            if !notes.iter().any(|n| n == note_id) {
                notes.push(note_id.to_string());
            }
            return deadline;
        }

        self.state = AutosaveState::PendingFlush {
            deadline,
            notes: vec![note_id.to_string()],
        };
        deadline
    }

    /// If the deadline has passed, go idle and return the edited notes.
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<NoteId>> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.cancel(),
            _ => None,
        }
    }

    /// Drop the pending timer, returning what it would have flushed.
    pub fn cancel(&mut self) -> Option<Vec<NoteId>> {
        match std::mem::replace(&mut self.state, AutosaveState::Idle) {
            AutosaveState::PendingFlush { notes, .. } => Some(notes),
            AutosaveState::Idle => None,
        }
    }
}
