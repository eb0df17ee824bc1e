//! MCP Tool Types
//!
//! Parameter and response types for every kiosk tool. Schemas are derived
//! with schemars so clients see the same field docs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use kiosk_core::{ActivityDetails, ComplaintRow, DashboardStats, PaymentRow, SessionState};

// =============================================================================
// Identity Tools
// =============================================================================

/// Parameters for kiosk_sign_in
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SignInParams {
    /// Authenticated user id (UUID)
    pub user_id: String,
}

/// Parameters for kiosk_sign_out
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SignOutParams {}

/// Response for identity tools
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IdentityResponse {
    /// Signed-in user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Human-readable result
    pub message: String,
}

// =============================================================================
// Session Lifecycle Tools
// =============================================================================

/// Parameters for kiosk_session_start
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionStartParams {}

/// Response for kiosk_session_start
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionStartResponse {
    /// Whether a session is now active
    pub started: bool,

    /// Session id when started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Human-readable result
    pub message: String,
}

/// Parameters for kiosk_session_end
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionEndParams {}

/// Response for kiosk_session_end
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionEndResponse {
    /// Whether a session was ended
    pub ended: bool,

    /// Human-readable result
    pub message: String,
}

// =============================================================================
// Activity Tools
// =============================================================================

/// Parameters for kiosk_record_activity
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordActivityParams {
    /// Input event: "pointerdown", "touchstart", "keydown" or "scroll"
    pub event: String,
}

/// Parameters for kiosk_log_activity
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogActivityParams {
    /// Action name (e.g., "view_bill", "pay_bill", "file_complaint")
    pub action_type: String,

    /// Department tag (e.g., "electricity", "gas", "municipal")
    #[serde(default)]
    pub department: Option<String>,

    /// Structured details; values are strings, numbers or booleans
    #[serde(default)]
    pub details: Option<ActivityDetails>,
}

/// Parameters for kiosk_reset_timer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResetTimerParams {}

/// Response for activity tools
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivityResponse {
    /// Whether the call counted as activity or was queued
    pub accepted: bool,

    /// Milliseconds left in the current session after the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,

    /// Human-readable result
    pub message: String,
}

// =============================================================================
// Status Tools
// =============================================================================

/// Parameters for kiosk_status
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StatusParams {}

/// Response for kiosk_status
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
    /// Current manager state
    pub state: SessionState,

    /// Configured kiosk id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiosk_id: Option<String>,

    /// Signed-in user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Parameters for kiosk_dashboard
///
/// Complaint and payment rows live outside the session store; callers pass
/// what they fetched. Sessions are read from the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DashboardParams {
    /// Newest complaint rows
    #[serde(default)]
    pub complaints: Vec<ComplaintRow>,

    /// Newest payment rows
    #[serde(default)]
    pub payments: Vec<PaymentRow>,
}

/// Response for kiosk_dashboard
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DashboardResponse {
    /// Summary counts
    pub stats: DashboardStats,

    /// Number of session rows read from the store
    pub sessions_read: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_activity_params_defaults() {
        let params: LogActivityParams =
            serde_json::from_str(r#"{"action_type": "view_bill"}"#).unwrap();
        assert_eq!(params.action_type, "view_bill");
        assert!(params.department.is_none());
        assert!(params.details.is_none());
    }

    #[test]
    fn test_empty_params_accept_empty_object() {
        let _: SessionStartParams = serde_json::from_str("{}").unwrap();
        let _: DashboardParams = serde_json::from_str("{}").unwrap();
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let response = SessionStartResponse {
            started: false,
            session_id: None,
            message: "No authenticated user".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("session_id").is_none());
    }
}
