//! Background task that fires autosave flushes.
//!
//! Sleeps until the coordinator's deadline. Edits that move the deadline
//! wake it through `Notify`, and it simply re-reads the deadline.

use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::service::NotesService;

/// Spawn the autosave loop for `service`. Runs until aborted.
pub fn spawn_autosave(service: NotesService) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let rearm: Arc<Notify> = service.rearm_handle();
        log::debug!("[AUTOSAVE] Driver started");

        loop {
            let deadline = service.with(|ws| ws.next_autosave_deadline());

            match deadline {
                None => rearm.notified().await,
                Some(deadline) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(Instant::from_std(deadline)) => {
                            let now = Instant::now().into_std();
                            if let Some(report) = service.with(|ws| ws.poll_autosave(now)) {
                                if report.persisted {
                                    log::debug!(
                                        "[AUTOSAVE] Flushed {} edited note(s), {} indexed",
                                        report.refreshed.len(),
                                        report.indexed
                                    );
                                } else {
                                    log::error!("[AUTOSAVE] Flush could not persist; changes kept in memory");
                                }
                            }
                        }
                        _ = rearm.notified() => {}
                    }
                }
            }
        }
    })
}
