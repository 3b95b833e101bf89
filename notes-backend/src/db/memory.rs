//! In-process state store with write-failure injection.

use parking_lot::Mutex;
use std::sync::Arc;

use super::StateStore;
use crate::error::{NotesError, NotesResult};

#[derive(Debug, Default)]
struct Slot {
    value: Option<String>,
    saves: usize,
    failures_left: usize,
}

/// Cloneable handle; every clone sees the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    slot: Arc<Mutex<Slot>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(raw: impl Into<String>) -> Self {
        let store = Self::default();
        store.slot.lock().value = Some(raw.into());
        store
    }

    /// Make the next `n` saves fail.
    pub fn fail_next_saves(&self, n: usize) {
        self.slot.lock().failures_left = n;
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.slot.lock().saves
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().value.clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> NotesResult<Option<String>> {
        Ok(self.slot.lock().value.clone())
    }

    fn save(&self, raw: &str) -> NotesResult<()> {
        let mut slot = self.slot.lock();
        if slot.failures_left > 0 {
            slot.failures_left -= 1;
            return Err(NotesError::PersistenceWriteFailure(
                "storage quota exceeded".to_string(),
            ));
        }
        slot.value = Some(raw.to_string());
        slot.saves += 1;
        Ok(())
    }
}
