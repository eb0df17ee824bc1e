//! Shared fixtures for kiosk-session integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kiosk_core::{Error, KioskId, KioskSession, NewActivityLog, Result, SessionId, UserId};
use kiosk_session::{
    KioskManagerConfig, KioskSessionManager, MemoryStore, SessionStore, StaticIdentity,
};

/// Memory store that counts calls and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    creates: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    appends: Arc<AtomicUsize>,
    fail_create: Arc<AtomicBool>,
    fail_close: Arc<AtomicBool>,
    fail_append: Arc<AtomicBool>,
}

impl RecordingStore {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn appends(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn fail_append(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn create_session(
        &self,
        user_id: UserId,
        kiosk_id: Option<&KioskId>,
    ) -> Result<SessionId> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::Transport("connection reset".to_string()));
        }
        self.inner.create_session(user_id, kiosk_id).await
    }

    async fn close_session(&self, session_id: SessionId, ended_at: DateTime<Utc>) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(Error::Backend {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        self.inner.close_session(session_id, ended_at).await
    }

    async fn append_activity_log(&self, entry: NewActivityLog) -> Result<()> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(Error::Transport("timed out".to_string()));
        }
        self.inner.append_activity_log(entry).await
    }

    async fn recent_sessions(&self, limit: usize) -> Result<Vec<KioskSession>> {
        self.inner.recent_sessions(limit).await
    }
}

pub fn user() -> UserId {
    UserId::from(uuid::Uuid::new_v4())
}

/// Manager over a fresh recording store, signed in as a new user.
pub fn signed_in_manager() -> (KioskSessionManager, RecordingStore, StaticIdentity) {
    manager_with(StaticIdentity::signed_in(user()), KioskManagerConfig::default())
}

pub fn manager_with(
    identity: StaticIdentity,
    config: KioskManagerConfig,
) -> (KioskSessionManager, RecordingStore, StaticIdentity) {
    let store = RecordingStore::default();
    let manager = KioskSessionManager::with_config(
        Arc::new(store.clone()),
        Arc::new(identity.clone()),
        config,
    );
    (manager, store, identity)
}
