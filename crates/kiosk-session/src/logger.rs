//! Fire-and-forget activity log queue.
//!
//! Callers enqueue rows without waiting; a single worker task appends them to
//! the store in order. Delivery is best-effort: a failed append is logged and
//! dropped, never retried.

use std::sync::{Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use kiosk_core::NewActivityLog;

use crate::store::SharedStore;

enum LogCommand {
    Append(NewActivityLog),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Handle to the activity log worker.
#[derive(Debug)]
pub struct ActivityLogger {
    tx: mpsc::UnboundedSender<LogCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ActivityLogger {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(store: SharedStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(store, rx));
        Self {
            tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a row for appending. Returns false once the worker has stopped.
    pub fn enqueue(&self, entry: NewActivityLog) -> bool {
        let action_type = entry.action_type.clone();
        match self.tx.send(LogCommand::Append(entry)) {
            Ok(()) => true,
            Err(_) => {
                debug!("Activity logger stopped, dropping: action_type={}", action_type);
                false
            }
        }
    }

    /// Wait until every row queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(LogCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Drain the queue and stop the worker.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(LogCommand::Shutdown);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("Activity logger worker ended abnormally: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for LogCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Append(entry) => write!(f, "Append({})", entry.action_type),
            Self::Flush(_) => f.write_str("Flush"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

async fn run_worker(store: SharedStore, mut rx: mpsc::UnboundedReceiver<LogCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            LogCommand::Append(entry) => {
                let action_type = entry.action_type.clone();
                let session_id = entry.session_id;
                match store.append_activity_log(entry).await {
                    Ok(()) => debug!(
                        "Activity logged: action_type={}, session_id={:?}",
                        action_type, session_id
                    ),
                    Err(e) => warn!(
                        "Failed to log activity: action_type={}, session_id={:?}: {}",
                        action_type, session_id, e
                    ),
                }
            }
            LogCommand::Flush(done) => {
                let _ = done.send(());
            }
            LogCommand::Shutdown => break,
        }
    }
    debug!("Activity logger worker stopped");
}
