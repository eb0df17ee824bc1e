//! Activity events and audit log records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, SessionId, UserId};

/// Interaction classes that count as user activity on a kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    /// Mouse or pen button pressed
    PointerDown,
    /// Finger touched the screen
    TouchStart,
    /// Keyboard key pressed
    KeyDown,
    /// Page or list scrolled
    Scroll,
}

impl ActivityEvent {
    /// Every event class the inactivity timer listens for.
    pub const ALL: [ActivityEvent; 4] = [
        ActivityEvent::PointerDown,
        ActivityEvent::TouchStart,
        ActivityEvent::KeyDown,
        ActivityEvent::Scroll,
    ];

    /// Parse an event from its DOM or snake_case name.
    ///
    /// Examples:
    /// - "mousedown" / "pointerdown" -> ActivityEvent::PointerDown
    /// - "touchstart" -> ActivityEvent::TouchStart
    /// - "keydown" -> ActivityEvent::KeyDown
    /// - "scroll" / "wheel" -> ActivityEvent::Scroll
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mousedown" | "pointerdown" | "pointer_down" => Ok(Self::PointerDown),
            "touchstart" | "touch_start" => Ok(Self::TouchStart),
            "keydown" | "key_down" => Ok(Self::KeyDown),
            "scroll" | "wheel" => Ok(Self::Scroll),
            _ => Err(Error::UnknownActivityEvent(s.to_string())),
        }
    }

    /// DOM event name the kiosk shell listens for.
    pub fn dom_name(&self) -> &'static str {
        match self {
            Self::PointerDown => "mousedown",
            Self::TouchStart => "touchstart",
            Self::KeyDown => "keydown",
            Self::Scroll => "scroll",
        }
    }
}

impl FromStr for ActivityEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_name())
    }
}

/// Scalar value allowed in activity details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DetailValue {
    /// Boolean flag
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Free text
    Text(String),
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for DetailValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Structured details attached to an activity log entry.
pub type ActivityDetails = BTreeMap<String, DetailValue>;

/// An activity log row waiting to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewActivityLog {
    /// Session the action happened in, if one was open
    pub session_id: Option<SessionId>,
    /// Acting user
    pub user_id: UserId,
    /// Free-form action name, e.g. "view_bill"
    pub action_type: String,
    /// Department tag
    pub department: Option<String>,
    /// Structured details, empty when none were given
    pub details: ActivityDetails,
}

/// A stored, append-only activity log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityLogEntry {
    /// Row identifier
    pub id: Uuid,
    /// Session reference
    pub session_id: Option<SessionId>,
    /// Acting user
    pub user_id: Option<UserId>,
    /// Action name
    pub action_type: String,
    /// Department tag
    #[serde(default)]
    pub department: Option<String>,
    /// Structured details
    #[serde(default)]
    pub details: Option<ActivityDetails>,
    /// Insert timestamp
    pub created_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    /// Materialise a pending log row with a fresh id and timestamp.
    pub fn from_new(entry: NewActivityLog, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: entry.session_id,
            user_id: Some(entry.user_id),
            action_type: entry.action_type,
            department: entry.department,
            details: Some(entry.details),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dom_names() {
        assert_eq!(
            ActivityEvent::parse("mousedown").unwrap(),
            ActivityEvent::PointerDown
        );
        assert_eq!(
            ActivityEvent::parse("touchstart").unwrap(),
            ActivityEvent::TouchStart
        );
        assert_eq!(
            ActivityEvent::parse("keydown").unwrap(),
            ActivityEvent::KeyDown
        );
        assert_eq!(ActivityEvent::parse("scroll").unwrap(), ActivityEvent::Scroll);
    }

    #[test]
    fn test_parse_aliases_and_case() {
        assert_eq!(
            ActivityEvent::parse(" PointerDown ").unwrap(),
            ActivityEvent::PointerDown
        );
        assert_eq!(ActivityEvent::parse("wheel").unwrap(), ActivityEvent::Scroll);
        assert_eq!(
            ActivityEvent::parse("key_down").unwrap(),
            ActivityEvent::KeyDown
        );
    }

    #[test]
    fn test_parse_rejects_passive_events() {
        // Hover and focus changes are not interactions
        for name in ["mousemove", "focus", "resize", ""] {
            assert!(matches!(
                ActivityEvent::parse(name),
                Err(Error::UnknownActivityEvent(_))
            ));
        }
    }

    #[test]
    fn test_dom_name_roundtrip() {
        for event in ActivityEvent::ALL {
            assert_eq!(event.dom_name().parse::<ActivityEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_detail_values_serialize_untagged() {
        let mut details = ActivityDetails::new();
        details.insert("amount".to_string(), 450.5.into());
        details.insert("bill".to_string(), "EB-2231".into());
        details.insert("paid".to_string(), true.into());

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["amount"], 450.5);
        assert_eq!(json["bill"], "EB-2231");
        assert_eq!(json["paid"], true);
    }

    #[test]
    fn test_entry_from_new_keeps_fields() {
        let user = UserId::from(Uuid::new_v4());
        let session = SessionId::new();
        let pending = NewActivityLog {
            session_id: Some(session),
            user_id: user,
            action_type: "view_bill".to_string(),
            department: Some("electricity".to_string()),
            details: ActivityDetails::new(),
        };
        let entry = ActivityLogEntry::from_new(pending, Utc::now());
        assert_eq!(entry.session_id, Some(session));
        assert_eq!(entry.user_id, Some(user));
        assert_eq!(entry.action_type, "view_bill");
        assert_eq!(entry.details, Some(ActivityDetails::new()));
    }
}
