//! Debounced autosave: a pure state machine plus the tokio task that keeps
//! time for it.

pub mod coordinator;
pub mod driver;

pub use coordinator::{AutosaveCoordinator, AutosaveState};
pub use driver::spawn_autosave;
