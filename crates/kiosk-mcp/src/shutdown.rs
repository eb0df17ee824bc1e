//! Orderly teardown of the session manager when the transport closes.

use std::sync::Arc;

use tracing::{info, warn};

use kiosk_session::KioskSessionManager;

/// End the open session, drain queued activity rows and dispose the manager.
///
/// Queued rows are flushed even when another handle still shares the
/// manager and it cannot be disposed.
pub async fn shutdown_manager(manager: Arc<KioskSessionManager>) {
    manager.end_session().await;
    manager.flush_activity().await;
    match Arc::try_unwrap(manager) {
        Ok(manager) => manager.dispose().await,
        Err(_) => warn!("Session manager still shared at shutdown; skipping dispose"),
    }
    info!("Session manager shut down");
}
