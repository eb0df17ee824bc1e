//! Persistent storage for kiosk sessions and activity logs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kiosk_core::{KioskId, KioskSession, NewActivityLog, Result, SessionId, UserId};

mod memory;
mod rest;

pub use memory::{MemoryStore, DEFAULT_KIOSK_ID};
pub use rest::RestStore;

/// Shared handle to any store implementation.
pub type SharedStore = Arc<dyn SessionStore>;

/// Abstract interface for session storage backends.
///
/// Writes carry no version check; the manager owning a session is its only
/// writer.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Inserts a session row with status `active` and returns its id.
    ///
    /// When `kiosk_id` is `None` the store assigns its default.
    async fn create_session(&self, user_id: UserId, kiosk_id: Option<&KioskId>)
        -> Result<SessionId>;

    /// Marks a session `completed` with the given end timestamp.
    async fn close_session(&self, session_id: SessionId, ended_at: DateTime<Utc>) -> Result<()>;

    /// Appends one activity log row.
    async fn append_activity_log(&self, entry: NewActivityLog) -> Result<()>;

    /// Returns up to `limit` sessions, newest start first.
    async fn recent_sessions(&self, limit: usize) -> Result<Vec<KioskSession>>;
}
