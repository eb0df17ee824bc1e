//! Kiosk session manager: owns the session lifecycle, the inactivity timer
//! task and the activity logger for one kiosk terminal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use kiosk_core::{
    ActivityDetails, ActivityEvent, Department, KioskId, KioskSession, NewActivityLog, Result,
    SessionId, SessionState, TICK_INTERVAL,
};

use crate::identity::SharedIdentity;
use crate::logger::ActivityLogger;
use crate::store::SharedStore;
use crate::timer::{InactivityTimer, Tick};

/// Configuration for the kiosk session manager.
#[derive(Debug, Clone, Default)]
pub struct KioskManagerConfig {
    /// Kiosk identifier written on new sessions (None = store default)
    pub kiosk_id: Option<KioskId>,
}

struct Shared {
    store: SharedStore,
    identity: SharedIdentity,
    kiosk_id: Option<KioskId>,
    timer: Mutex<InactivityTimer>,
    state_tx: watch::Sender<SessionState>,
    logger: ActivityLogger,
}

impl Shared {
    fn timer(&self) -> MutexGuard<'_, InactivityTimer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self) {
        let state = self.timer().state(Instant::now());
        self.state_tx.send_replace(state);
    }

    /// Best-effort close: a failed write is only logged.
    async fn close(&self, session_id: SessionId) {
        match self.store.close_session(session_id, Utc::now()).await {
            Ok(()) => info!("Kiosk session closed: session_id={}", session_id),
            Err(e) => warn!(
                "Failed to close kiosk session {}, treating it as ended: {}",
                session_id, e
            ),
        }
    }
}

struct Ticker {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Supervises one kiosk's usage session with automatic inactivity timeout.
///
/// Must be created inside a tokio runtime: the activity logger worker is
/// spawned immediately, the tick task on every successful start.
pub struct KioskSessionManager {
    shared: Arc<Shared>,
    ticker: Mutex<Option<Ticker>>,
}

impl KioskSessionManager {
    /// Create a manager with default configuration.
    pub fn new(store: SharedStore, identity: SharedIdentity) -> Self {
        Self::with_config(store, identity, KioskManagerConfig::default())
    }

    /// Create a manager with custom configuration.
    pub fn with_config(
        store: SharedStore,
        identity: SharedIdentity,
        config: KioskManagerConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        let logger = ActivityLogger::spawn(Arc::clone(&store));
        Self {
            shared: Arc::new(Shared {
                store,
                identity,
                kiosk_id: config.kiosk_id,
                timer: Mutex::new(InactivityTimer::new()),
                state_tx,
                logger,
            }),
            ticker: Mutex::new(None),
        }
    }

    /// Open a new kiosk session for the signed-in user.
    ///
    /// Returns `None` without touching the store when nobody is signed in,
    /// and `None` when the store rejects the insert. If a session is already
    /// running its id is returned unchanged.
    pub async fn start_session(&self) -> Option<SessionId> {
        let Some(user_id) = self.shared.identity.current_user() else {
            debug!("start_session skipped: no authenticated user");
            return None;
        };

        if let Some(current) = self.session_id() {
            debug!("start_session skipped: session {} already running", current);
            return Some(current);
        }

        let session_id = match self
            .shared
            .store
            .create_session(user_id, self.shared.kiosk_id.as_ref())
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to create kiosk session for user {}: {}", user_id, e);
                return None;
            }
        };

        let winner = {
            let mut timer = self.shared.timer();
            match timer.session_id() {
                Some(existing) => Some(existing),
                None => {
                    timer.start(session_id, Instant::now());
                    None
                }
            }
        };
        if let Some(existing) = winner {
            // A concurrent start got there first; retire our row
            warn!(
                "Concurrent start_session: keeping {}, closing duplicate {}",
                existing, session_id
            );
            self.shared.close(session_id).await;
            return Some(existing);
        }

        self.spawn_ticker();
        self.shared.publish();
        info!(
            "Kiosk session started: session_id={}, user_id={}, kiosk_id={}",
            session_id,
            user_id,
            self.shared
                .kiosk_id
                .as_ref()
                .map_or("<default>", KioskId::as_str)
        );
        Some(session_id)
    }

    /// Close the current session, if any.
    ///
    /// The controller always ends up idle, even when the store write fails.
    /// Returns whether a session was open.
    pub async fn end_session(&self) -> bool {
        self.stop_ticker();
        let session_id = self.shared.timer().stop();

        let had_session = match session_id {
            Some(id) => {
                self.shared.close(id).await;
                true
            }
            None => {
                debug!("end_session: no session to close");
                false
            }
        };
        self.shared.publish();
        had_session
    }

    /// Feed a raw interaction into the activity clock.
    ///
    /// Returns false while idle: input is only listened for during a session.
    pub fn record_activity(&self, event: ActivityEvent) -> bool {
        let touched = self.shared.timer().touch(Instant::now());
        if touched {
            debug!("Activity detected: event={}", event);
            self.shared.publish();
        }
        touched
    }

    /// Restart the inactivity window without an input event.
    pub fn reset_timer(&self) -> bool {
        let touched = self.shared.timer().touch(Instant::now());
        if touched {
            self.shared.publish();
        }
        touched
    }

    /// Queue an audit record for the signed-in user and count it as activity.
    ///
    /// Does not wait for the write. Known department tags are stored in
    /// their lowercase form. Returns false when nobody is signed in (nothing
    /// is queued) or the logger has stopped.
    pub fn log_activity(
        &self,
        action_type: impl Into<String>,
        department: Option<&str>,
        details: Option<ActivityDetails>,
    ) -> bool {
        let action_type = action_type.into();
        let Some(user_id) = self.shared.identity.current_user() else {
            debug!("log_activity skipped: no authenticated user, action_type={}", action_type);
            return false;
        };

        let (touched, session_id) = {
            let mut timer = self.shared.timer();
            (timer.touch(Instant::now()), timer.session_id())
        };
        if touched {
            self.shared.publish();
        }

        self.shared.logger.enqueue(NewActivityLog {
            session_id,
            user_id,
            action_type,
            department: department.map(Department::normalize_tag),
            details: details.unwrap_or_default(),
        })
    }

    /// Wait until every activity record queued so far has been attempted.
    pub async fn flush_activity(&self) {
        self.shared.logger.flush().await;
    }

    /// Newest session rows from the store, for reporting.
    pub async fn recent_sessions(&self, limit: usize) -> Result<Vec<KioskSession>> {
        self.shared.store.recent_sessions(limit).await
    }

    /// Current state computed now.
    pub fn snapshot(&self) -> SessionState {
        self.shared.timer().state(Instant::now())
    }

    /// Receive every published state: starts, ticks, activity resets, ends.
    ///
    /// After a close the idle state is published once the store write has
    /// been attempted.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Whether a session is being tracked.
    pub fn is_active(&self) -> bool {
        self.shared.timer().is_running()
    }

    /// Current session id, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.shared.timer().session_id()
    }

    /// Time left before the current session expires.
    pub fn remaining(&self) -> Option<Duration> {
        self.snapshot().remaining()
    }

    /// Configured kiosk id.
    pub fn kiosk_id(&self) -> Option<&KioskId> {
        self.shared.kiosk_id.as_ref()
    }

    /// Release the manager: cancel the tick task, stop listening for
    /// activity and drain the log queue.
    ///
    /// An open session is not closed; call [`end_session`](Self::end_session)
    /// first to close it in the store.
    pub async fn dispose(self) {
        if let Some(ticker) = self.take_ticker() {
            drop(ticker.stop);
            if let Err(e) = ticker.task.await {
                warn!("Inactivity timer task ended abnormally: {}", e);
            }
        }
        if let Some(session_id) = self.shared.timer().stop() {
            info!("Disposing with session {} still open", session_id);
        }
        self.shared.publish();
        self.shared.logger.shutdown().await;
        info!("Kiosk session manager disposed");
    }

    fn take_ticker(&self) -> Option<Ticker> {
        self.ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn stop_ticker(&self) {
        // Dropping the stop sender wakes the task; an expiry close already
        // in flight still completes.
        drop(self.take_ticker());
    }

    fn spawn_ticker(&self) {
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_ticker(Arc::clone(&self.shared), stop_rx));
        let previous = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Ticker { stop, task });
        drop(previous);
    }
}

impl Drop for KioskSessionManager {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

async fn run_ticker(shared: Arc<Shared>, mut stop: oneshot::Receiver<()>) {
    let mut interval = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => {
                debug!("Inactivity timer cancelled");
                return;
            }
            _ = interval.tick() => {}
        }

        let tick = shared.timer().tick(Instant::now());
        match tick {
            Tick::Remaining(remaining) => {
                debug!("Inactivity tick: remaining_ms={}", remaining.as_millis());
                shared.publish();
            }
            Tick::Expired(session_id) => {
                info!("Kiosk session timed out: session_id={}", session_id);
                shared.close(session_id).await;
                shared.publish();
                return;
            }
            Tick::Idle => return,
        }
    }
}
