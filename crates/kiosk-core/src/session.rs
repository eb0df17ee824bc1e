//! Session types for kiosk session management.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Inactivity window after which an idle kiosk session is closed.
pub const SESSION_TIMEOUT: Duration = Duration::from_millis(180_000);

/// Period of the inactivity timer tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

lazy_static! {
    static ref KIOSK_ID_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,63}$").unwrap();
}

/// Server-assigned identifier of a kiosk session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("Invalid session ID format: {s}")))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an authenticated portal user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("Invalid user ID format: {s}")))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a physical kiosk terminal.
///
/// Alphanumeric first character, then up to 63 of `[A-Za-z0-9_.-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct KioskId(String);

impl KioskId {
    /// Validate and wrap a kiosk identifier.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if KIOSK_ID_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidKioskId(value))
        }
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KioskId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<KioskId> for String {
    fn from(id: KioskId) -> Self {
        id.0
    }
}

impl fmt::Display for KioskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted status of a kiosk session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is open
    Active,
    /// Session was closed (manually or on timeout)
    Completed,
    /// Any status string written by other clients
    #[serde(other)]
    Unknown,
}

impl SessionStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

/// A kiosk session row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KioskSession {
    /// Session identifier
    pub id: SessionId,
    /// Owning user
    pub user_id: Option<UserId>,
    /// Terminal the session ran on
    pub kiosk_id: String,
    /// Department the session was opened for, if any
    #[serde(default)]
    pub department: Option<String>,
    /// Start timestamp
    pub started_at: DateTime<Utc>,
    /// End timestamp, absent while active
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Current status
    pub status: SessionStatus,
    /// Number of activity log rows recorded against the session
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions_count: u32,
}

impl KioskSession {
    /// Whether the row is still open.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Controller-side state of the kiosk session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No session is tracked
    Idle,
    /// A session is open and the inactivity timer is running
    Running {
        /// Current session
        session_id: SessionId,
        /// Milliseconds left before the session is closed
        remaining_ms: u64,
    },
}

impl SessionState {
    /// Whether a session is being tracked.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Current session identifier, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::Running { session_id, .. } => Some(*session_id),
            Self::Idle => None,
        }
    }

    /// Time left before expiry; `None` while idle.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Running { remaining_ms, .. } => Some(Duration::from_millis(*remaining_ms)),
            Self::Idle => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}
