//! Activity clock: when did the user last touch the kiosk.

use std::time::Duration;

use tokio::time::Instant;

/// Tracks the instant of the last detected interaction.
#[derive(Debug, Clone, Copy)]
pub struct ActivityClock {
    last_activity: Instant,
    timeout: Duration,
}

impl ActivityClock {
    /// Create a clock whose last activity is `now`.
    pub fn new(now: Instant, timeout: Duration) -> Self {
        Self {
            last_activity: now,
            timeout,
        }
    }

    /// Record an interaction at `now`.
    ///
    /// An instant older than the recorded one is ignored so the clock never
    /// moves backwards.
    pub fn touch(&mut self, now: Instant) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// Instant of the last recorded interaction.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// `max(0, timeout - (now - last_activity))`.
    pub fn remaining(&self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_activity);
        self.timeout.saturating_sub(elapsed)
    }
}
