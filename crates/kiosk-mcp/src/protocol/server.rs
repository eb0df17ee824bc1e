//! Kiosk MCP Server Implementation
//!
//! This module implements the MCP server using rmcp 0.9's #[tool_router] pattern.
//! It routes MCP tool calls to the kiosk session manager.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use kiosk_core::{ActivityEvent, DashboardStats, UserId, DASHBOARD_ROW_LIMIT};
use kiosk_session::{IdentityProvider, KioskSessionManager, StaticIdentity};

use crate::tools::*;

fn invalid_params(message: String) -> McpError {
    McpError::new(ErrorCode(-32602), message, None)
}

fn json_content<T: Serialize>(response: &T, fallback: impl FnOnce() -> String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(response).unwrap_or_else(|_| fallback()),
    )])
}

fn remaining_ms(manager: &KioskSessionManager) -> Option<u64> {
    manager.remaining().map(|d| d.as_millis() as u64)
}

/// Kiosk MCP Server
///
/// Exposes one kiosk's session manager and sign-in state via MCP tools.
#[derive(Clone)]
pub struct KioskMcpServer {
    /// Session manager driven by the tools
    manager: Arc<KioskSessionManager>,
    /// Identity shared with the manager
    identity: StaticIdentity,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KioskMcpServer {
    /// Create a server around a manager that reads `identity` for the user.
    pub fn new(manager: Arc<KioskSessionManager>, identity: StaticIdentity) -> Self {
        Self {
            manager,
            identity,
            tool_router: Self::tool_router(),
        }
    }

    /// The manager behind the tools.
    pub fn manager(&self) -> &Arc<KioskSessionManager> {
        &self.manager
    }

    /// Sign a user in
    #[tool(description = "Record the authenticated kiosk user; sessions and logs are attributed to them")]
    #[instrument(skip_all)]
    async fn kiosk_sign_in(
        &self,
        Parameters(params): Parameters<SignInParams>,
    ) -> Result<CallToolResult, McpError> {
        let user_id: UserId = params.user_id.parse().map_err(|e| {
            warn!("Rejected sign-in: {}", e);
            invalid_params(format!("{e}"))
        })?;

        self.identity.sign_in(user_id);

        let response = IdentityResponse {
            user_id: Some(user_id.to_string()),
            message: format!("Signed in as {user_id}"),
        };
        Ok(json_content(&response, || response.message.clone()))
    }

    /// Sign the current user out
    #[tool(description = "Forget the authenticated kiosk user; an open session keeps running until ended or timed out")]
    #[instrument(skip_all)]
    async fn kiosk_sign_out(
        &self,
        Parameters(_params): Parameters<SignOutParams>,
    ) -> Result<CallToolResult, McpError> {
        let previous = self.identity.current_user();
        self.identity.sign_out();

        let response = IdentityResponse {
            user_id: None,
            message: match previous {
                Some(user_id) => format!("Signed out {user_id}"),
                None => "Nobody was signed in".to_string(),
            },
        };
        Ok(json_content(&response, || response.message.clone()))
    }

    /// Start a kiosk session
    #[tool(description = "Open a kiosk session for the signed-in user and start the 3-minute inactivity timer")]
    #[instrument(skip_all)]
    async fn kiosk_session_start(
        &self,
        Parameters(_params): Parameters<SessionStartParams>,
    ) -> Result<CallToolResult, McpError> {
        let response = match self.manager.start_session().await {
            Some(session_id) => {
                info!("Kiosk session active: session_id={}", session_id);
                SessionStartResponse {
                    started: true,
                    session_id: Some(session_id.to_string()),
                    message: format!("Session {session_id} active"),
                }
            }
            None if self.identity.current_user().is_none() => SessionStartResponse {
                started: false,
                session_id: None,
                message: "No authenticated user; sign in first".to_string(),
            },
            None => SessionStartResponse {
                started: false,
                session_id: None,
                message: "Session store rejected the new session".to_string(),
            },
        };
        Ok(json_content(&response, || response.message.clone()))
    }

    /// End the current kiosk session
    #[tool(description = "Close the current kiosk session in the store and stop the inactivity timer")]
    #[instrument(skip_all)]
    async fn kiosk_session_end(
        &self,
        Parameters(_params): Parameters<SessionEndParams>,
    ) -> Result<CallToolResult, McpError> {
        let ended = self.manager.end_session().await;
        let response = SessionEndResponse {
            ended,
            message: if ended {
                "Session ended".to_string()
            } else {
                "No active session".to_string()
            },
        };
        Ok(json_content(&response, || response.message.clone()))
    }

    /// Report a raw input event
    #[tool(description = "Report a user input event (pointerdown, touchstart, keydown, scroll); resets the inactivity timer")]
    #[instrument(skip_all)]
    async fn kiosk_record_activity(
        &self,
        Parameters(params): Parameters<RecordActivityParams>,
    ) -> Result<CallToolResult, McpError> {
        let event = ActivityEvent::parse(&params.event).map_err(|e| {
            debug!("Rejected activity event {:?}: {}", params.event, e);
            invalid_params(format!("{e}"))
        })?;

        let accepted = self.manager.record_activity(event);
        let response = ActivityResponse {
            accepted,
            remaining_ms: remaining_ms(&self.manager),
            message: if accepted {
                format!("{event} recorded")
            } else {
                "No active session".to_string()
            },
        };
        Ok(json_content(&response, || response.message.clone()))
    }

    /// Append an activity log entry
    #[tool(description = "Append an audit record for the signed-in user (action type, department, details) and reset the inactivity timer")]
    #[instrument(skip_all)]
    async fn kiosk_log_activity(
        &self,
        Parameters(params): Parameters<LogActivityParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.action_type.trim().is_empty() {
            return Err(invalid_params("action_type must not be empty".to_string()));
        }

        let action_type = params.action_type.clone();
        let accepted = self.manager.log_activity(
            params.action_type,
            params.department.as_deref(),
            params.details,
        );
        let response = ActivityResponse {
            accepted,
            remaining_ms: remaining_ms(&self.manager),
            message: if accepted {
                format!("Queued '{action_type}'")
            } else {
                "No authenticated user; nothing logged".to_string()
            },
        };
        Ok(json_content(&response, || response.message.clone()))
    }

    /// Reset the inactivity timer
    #[tool(description = "Reset the inactivity timer without logging anything")]
    #[instrument(skip_all)]
    async fn kiosk_reset_timer(
        &self,
        Parameters(_params): Parameters<ResetTimerParams>,
    ) -> Result<CallToolResult, McpError> {
        let accepted = self.manager.reset_timer();
        let response = ActivityResponse {
            accepted,
            remaining_ms: remaining_ms(&self.manager),
            message: if accepted {
                "Timer reset".to_string()
            } else {
                "No active session".to_string()
            },
        };
        Ok(json_content(&response, || response.message.clone()))
    }

    /// Report current status
    #[tool(description = "Current session state, remaining time, kiosk id and signed-in user")]
    #[instrument(skip_all)]
    async fn kiosk_status(
        &self,
        Parameters(_params): Parameters<StatusParams>,
    ) -> Result<CallToolResult, McpError> {
        let response = StatusResponse {
            state: self.manager.snapshot(),
            kiosk_id: self.manager.kiosk_id().map(ToString::to_string),
            user_id: self.identity.current_user().map(|u| u.to_string()),
        };
        Ok(json_content(&response, || format!("{:?}", response.state)))
    }

    /// Compute dashboard counts
    #[tool(description = "Summary counts over the newest 50 sessions from the store plus supplied complaint and payment rows")]
    #[instrument(skip_all)]
    async fn kiosk_dashboard(
        &self,
        Parameters(params): Parameters<DashboardParams>,
    ) -> Result<CallToolResult, McpError> {
        let sessions = self
            .manager
            .recent_sessions(DASHBOARD_ROW_LIMIT)
            .await
            .map_err(|e| {
                error!("Failed to read sessions for dashboard: {}", e);
                McpError::new(
                    ErrorCode(-32603),
                    format!("Failed to read sessions: {e}"),
                    None,
                )
            })?;

        let complaints = &params.complaints[..params.complaints.len().min(DASHBOARD_ROW_LIMIT)];
        let payments = &params.payments[..params.payments.len().min(DASHBOARD_ROW_LIMIT)];
        let stats = DashboardStats::compute(complaints, payments, &sessions);

        debug!(
            "Dashboard computed: sessions={}, active={}",
            sessions.len(),
            stats.active_sessions
        );

        let response = DashboardResponse {
            stats,
            sessions_read: sessions.len(),
        };
        Ok(json_content(&response, || format!("{:?}", response.stats)))
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for KioskMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Kiosk MCP Server - Drive a public kiosk's usage session. \
                 Use kiosk_sign_in then kiosk_session_start to open a session, \
                 kiosk_record_activity or kiosk_log_activity as the user interacts, \
                 and kiosk_session_end when they leave. Idle sessions close after 3 minutes."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_session::MemoryStore;

    fn server_with_store() -> (KioskMcpServer, MemoryStore) {
        let identity = StaticIdentity::anonymous();
        let store = MemoryStore::new();
        let manager = KioskSessionManager::new(Arc::new(store.clone()), Arc::new(identity.clone()));
        (KioskMcpServer::new(Arc::new(manager), identity), store)
    }

    fn server() -> KioskMcpServer {
        server_with_store().0
    }

    fn text(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).unwrap();
        value["content"][0]["text"].as_str().unwrap().to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requires_sign_in() {
        let server = server();
        let result = server
            .kiosk_session_start(Parameters(SessionStartParams {}))
            .await
            .unwrap();
        let response: SessionStartResponse = serde_json::from_str(&text(&result)).unwrap();
        assert!(!response.started);
        assert!(!server.manager().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_then_start() {
        let server = server();
        server
            .kiosk_sign_in(Parameters(SignInParams {
                user_id: uuid::Uuid::new_v4().to_string(),
            }))
            .await
            .unwrap();

        let result = server
            .kiosk_session_start(Parameters(SessionStartParams {}))
            .await
            .unwrap();
        let response: SessionStartResponse = serde_json::from_str(&text(&result)).unwrap();
        assert!(response.started);
        assert_eq!(
            response.session_id,
            server.manager().session_id().map(|id| id.to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_params_are_rejected() {
        let server = server();
        let err = server
            .kiosk_sign_in(Parameters(SignInParams {
                user_id: "not-a-uuid".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode(-32602));

        let err = server
            .kiosk_record_activity(Parameters(RecordActivityParams {
                event: "hover".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode(-32602));

        let err = server
            .kiosk_log_activity(Parameters(LogActivityParams {
                action_type: "  ".to_string(),
                department: None,
                details: None,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode(-32602));
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_activity_stores_canonical_department() {
        let (server, store) = server_with_store();
        server
            .kiosk_sign_in(Parameters(SignInParams {
                user_id: uuid::Uuid::new_v4().to_string(),
            }))
            .await
            .unwrap();

        server
            .kiosk_log_activity(Parameters(LogActivityParams {
                action_type: "view_bill".to_string(),
                department: Some("Electricity".to_string()),
                details: None,
            }))
            .await
            .unwrap();
        server.manager().flush_activity().await;

        let logs = store.activity_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].department.as_deref(), Some("electricity"));
    }
}
