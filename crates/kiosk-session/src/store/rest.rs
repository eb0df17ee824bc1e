use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use kiosk_core::{
    BackendSettings, Error, KioskId, KioskSession, NewActivityLog, Result, SessionId,
    SessionStatus, UserId,
};

use super::SessionStore;

const SESSIONS_TABLE: &str = "kiosk_sessions";
const ACTIVITY_LOGS_TABLE: &str = "kiosk_activity_logs";

#[derive(Debug, Deserialize)]
struct InsertedId {
    id: SessionId,
}

/// Session store backed by the managed backend's REST interface.
///
/// Speaks the PostgREST dialect: tables under `/rest/v1/`, filters as
/// `column=eq.value`, `Prefer: return=representation` to read back inserts.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestStore {
    /// Create a store for the project at `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Build a store from validated backend settings.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| Error::Config("backend.url is required for rest".to_string()))?;
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("backend.api_key is required for rest".to_string()))?;

        let mut store = Self::new(url, api_key);
        store.access_token = settings.access_token.clone();
        Ok(store)
    }

    /// Send requests on behalf of a signed-in user.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        Err(Error::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

fn create_body(user_id: UserId, kiosk_id: Option<&KioskId>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "user_id": user_id,
        "status": SessionStatus::Active,
    });
    if let Some(kiosk_id) = kiosk_id {
        body["kiosk_id"] = serde_json::json!(kiosk_id);
    }
    body
}

fn close_body(ended_at: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "ended_at": ended_at,
        "status": SessionStatus::Completed,
    })
}

fn id_filter(session_id: SessionId) -> String {
    format!("eq.{session_id}")
}

#[async_trait]
impl SessionStore for RestStore {
    async fn create_session(
        &self,
        user_id: UserId,
        kiosk_id: Option<&KioskId>,
    ) -> Result<SessionId> {
        let url = self.table_url(SESSIONS_TABLE);
        debug!("POST {}", url);

        let response = self
            .send(
                self.request(Method::POST, &url)
                    .header("Prefer", "return=representation")
                    .json(&create_body(user_id, kiosk_id)),
            )
            .await?;

        let rows: Vec<InsertedId> = response
            .json()
            .await
            .map_err(|e| Error::UnexpectedResponse(e.to_string()))?;
        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| Error::UnexpectedResponse("insert returned no rows".to_string()))
    }

    async fn close_session(&self, session_id: SessionId, ended_at: DateTime<Utc>) -> Result<()> {
        let url = self.table_url(SESSIONS_TABLE);
        debug!("PATCH {} id={}", url, session_id);

        self.send(
            self.request(Method::PATCH, &url)
                .query(&[("id", id_filter(session_id))])
                .header("Prefer", "return=minimal")
                .json(&close_body(ended_at)),
        )
        .await?;
        Ok(())
    }

    async fn append_activity_log(&self, entry: NewActivityLog) -> Result<()> {
        let url = self.table_url(ACTIVITY_LOGS_TABLE);
        debug!("POST {} action_type={}", url, entry.action_type);

        self.send(
            self.request(Method::POST, &url)
                .header("Prefer", "return=minimal")
                .json(&[entry]),
        )
        .await?;
        Ok(())
    }

    async fn recent_sessions(&self, limit: usize) -> Result<Vec<KioskSession>> {
        let url = self.table_url(SESSIONS_TABLE);
        debug!("GET {} limit={}", url, limit);

        let response = self
            .send(self.request(Method::GET, &url).query(&[
                ("select", "*".to_string()),
                ("order", "started_at.desc".to_string()),
                ("limit", limit.to_string()),
            ]))
            .await?;

        response
            .json()
            .await
            .map_err(|e| Error::UnexpectedResponse(e.to_string()))
    }
}
