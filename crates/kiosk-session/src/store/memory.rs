use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kiosk_core::{
    ActivityLogEntry, Error, KioskId, KioskSession, NewActivityLog, Result, SessionId,
    SessionStatus, UserId,
};

use super::SessionStore;

/// Kiosk id assigned when the caller does not provide one.
pub const DEFAULT_KIOSK_ID: &str = "default";

#[derive(Debug, Default)]
struct Tables {
    sessions: Vec<KioskSession>,
    activity_logs: Vec<ActivityLogEntry>,
}

/// An in-memory session store.
///
/// Useful for testing, demos and single-process kiosks. Mirrors the managed
/// backend's behaviour: default kiosk id, foreign key from log rows to
/// sessions, and `actions_count` bumped on every log insert.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All session rows in insertion order.
    pub fn sessions(&self) -> Vec<KioskSession> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .clone()
    }

    /// Look up one session row.
    pub fn session(&self, session_id: SessionId) -> Option<KioskSession> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
    }

    /// All activity log rows in insertion order.
    pub fn activity_logs(&self) -> Vec<ActivityLogEntry> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .activity_logs
            .clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(
        &self,
        user_id: UserId,
        kiosk_id: Option<&KioskId>,
    ) -> Result<SessionId> {
        let session = KioskSession {
            id: SessionId::new(),
            user_id: Some(user_id),
            kiosk_id: kiosk_id
                .map(|k| k.as_str().to_string())
                .unwrap_or_else(|| DEFAULT_KIOSK_ID.to_string()),
            department: None,
            started_at: Utc::now(),
            ended_at: None,
            status: SessionStatus::Active,
            actions_count: 0,
        };
        let id = session.id;

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.sessions.push(session);
        Ok(id)
    }

    async fn close_session(&self, session_id: SessionId, ended_at: DateTime<Utc>) -> Result<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(Error::SessionNotFound(session_id))?;
        session.ended_at = Some(ended_at);
        session.status = SessionStatus::Completed;
        Ok(())
    }

    async fn append_activity_log(&self, entry: NewActivityLog) -> Result<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(session_id) = entry.session_id {
            let session = tables
                .sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| {
                    Error::Store(format!(
                        "activity log references unknown session {session_id}"
                    ))
                })?;
            session.actions_count += 1;
        }

        tables
            .activity_logs
            .push(ActivityLogEntry::from_new(entry, Utc::now()));
        Ok(())
    }

    async fn recent_sessions(&self, limit: usize) -> Result<Vec<KioskSession>> {
        let mut sessions = self.sessions();
        // Stable sort keeps later inserts first among equal timestamps
        sessions.reverse();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}
