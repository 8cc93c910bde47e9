//! Background status polling.

use std::sync::Arc;
use std::time::Duration;

use guessnum_game::SessionId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, warn};

use crate::backend::{SessionBackend, StatusSnapshot};
use crate::error::SessionErrorKind;

/// Polls one session on a fixed interval and hands out the latest snapshot.
///
/// Only the newest unread snapshot is kept; older unread ones are replaced.
/// Failed polls are logged and skipped. The task stops on [`Poller::cancel`],
/// on drop, or once nobody reads the snapshots.
#[derive(Debug)]
pub struct Poller {
    task: Option<JoinHandle<()>>,
    latest: watch::Receiver<Option<StatusSnapshot>>,
}

impl Poller {
    /// Starts polling `id`; the first poll happens one `interval` from now.
    #[instrument(skip_all, fields(session = %id))]
    pub fn start(backend: Arc<dyn SessionBackend>, id: SessionId, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match backend.poll_status(&id).await {
                    Ok(snapshot) => {
                        debug!(
                            session = %id,
                            guesses = snapshot.history.len(),
                            active = snapshot.active,
                            "Polled status"
                        );
                        if tx.send(Some(snapshot)).is_err() {
                            debug!(session = %id, "Snapshot receiver dropped, stopping poller");
                            break;
                        }
                    }
                    Err(e) if e.kind == SessionErrorKind::ServiceUnavailable => {
                        debug!(session = %id, error = %e, "Poll failed");
                    }
                    Err(e) => {
                        warn!(session = %id, error = %e, "Poll failed");
                    }
                }
            }
        });

        info!(interval_ms = interval.as_millis() as u64, "Polling started");
        Self {
            task: Some(task),
            latest: rx,
        }
    }

    /// Waits for a snapshot newer than the last one returned; `None` once
    /// polling stopped.
    pub async fn next(&mut self) -> Option<StatusSnapshot> {
        if self.task.is_none() {
            return None;
        }
        self.latest.changed().await.ok()?;
        self.latest.borrow_and_update().clone()
    }

    /// Stops polling. Returns `true` only if this call stopped the task.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                info!("Polling cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether the polling task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}
