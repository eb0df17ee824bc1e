//! Inactivity timer state machine.
//!
//! The timer is a plain value: callers feed it instants and it answers with
//! what should happen. The manager drives it from a 1 s interval task.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use kiosk_core::{SessionId, SessionState, SESSION_TIMEOUT};

use crate::clock::ActivityClock;

/// Outcome of a single timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No session is tracked; the tick task should stop
    Idle,
    /// Session still open with this much time left
    Remaining(Duration),
    /// Remaining time hit zero; the timer is now idle and the session must be closed
    Expired(SessionId),
}

#[derive(Debug, Clone, Copy)]
struct Running {
    session_id: SessionId,
    clock: ActivityClock,
}

/// Two-state inactivity timer: idle, or running for one session.
#[derive(Debug, Clone, Default)]
pub struct InactivityTimer {
    running: Option<Running>,
}

impl InactivityTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition to running for `session_id`, with the clock starting at `now`.
    pub fn start(&mut self, session_id: SessionId, now: Instant) {
        self.running = Some(Running {
            session_id,
            clock: ActivityClock::new(now, SESSION_TIMEOUT),
        });
    }

    /// Transition to idle, returning the session that was running.
    pub fn stop(&mut self) -> Option<SessionId> {
        self.running.take().map(|r| r.session_id)
    }

    /// Record activity at `now`. Returns false when idle (nothing listens).
    pub fn touch(&mut self, now: Instant) -> bool {
        match self.running.as_mut() {
            Some(running) => {
                running.clock.touch(now);
                true
            }
            None => false,
        }
    }

    /// Advance the timer to `now`.
    ///
    /// On expiry the timer goes idle before returning, so a session expires
    /// at most once.
    pub fn tick(&mut self, now: Instant) -> Tick {
        let Some(running) = self.running else {
            return Tick::Idle;
        };

        let remaining = running.clock.remaining(now);
        if remaining.is_zero() {
            self.running = None;
            debug!("Inactivity timeout reached: session_id={}", running.session_id);
            Tick::Expired(running.session_id)
        } else {
            Tick::Remaining(remaining)
        }
    }

    /// Whether a session is being tracked.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Current session, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.running.map(|r| r.session_id)
    }

    /// Snapshot of the timer as seen at `now`.
    pub fn state(&self, now: Instant) -> SessionState {
        match self.running {
            Some(running) => SessionState::Running {
                session_id: running.session_id,
                remaining_ms: running.clock.remaining(now).as_millis() as u64,
            },
            None => SessionState::Idle,
        }
    }
}
