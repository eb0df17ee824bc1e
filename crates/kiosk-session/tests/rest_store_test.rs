//! REST store against a one-shot local HTTP backend.
//!
//! Each backend accepts a single connection, records the request and replies
//! with a canned response.

use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use kiosk_core::{
    ActivityDetails, Error, KioskId, NewActivityLog, SessionId, SessionStatus, UserId,
};
use kiosk_session::{RestStore, SessionStore};

#[derive(Debug)]
struct CapturedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key == "content-length")
        .map(|(_, value)| value.parse::<usize>().unwrap())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending the body");
        buf.extend_from_slice(&chunk[..n]);
    }

    CapturedRequest {
        request_line,
        headers,
        body: String::from_utf8(buf[header_end..header_end + content_length].to_vec()).unwrap(),
    }
}

/// Start a backend answering one request with `status` and `body`.
async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let task = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });
    (format!("http://{addr}"), task)
}

fn user() -> UserId {
    UserId::from(uuid::Uuid::new_v4())
}

#[tokio::test]
async fn test_create_session_reads_back_inserted_id() {
    let id = SessionId::new();
    let (url, backend) = serve_once("201 Created", &format!(r#"[{{"id":"{id}"}}]"#)).await;
    let store = RestStore::new(url, "anon");
    let kiosk_id = KioskId::new("lobby-01").unwrap();
    let user_id = user();

    let created = store.create_session(user_id, Some(&kiosk_id)).await.unwrap();
    assert_eq!(created, id);

    let request = backend.await.unwrap();
    assert_eq!(request.request_line, "POST /rest/v1/kiosk_sessions HTTP/1.1");
    assert_eq!(request.header("apikey"), Some("anon"));
    assert_eq!(request.header("authorization"), Some("Bearer anon"));
    assert_eq!(request.header("prefer"), Some("return=representation"));

    let body = request.json();
    assert_eq!(body["user_id"], user_id.to_string());
    assert_eq!(body["status"], "active");
    assert_eq!(body["kiosk_id"], "lobby-01");
}

#[tokio::test]
async fn test_create_session_without_kiosk_id_omits_column() {
    let id = SessionId::new();
    let (url, backend) = serve_once("201 Created", &format!(r#"[{{"id":"{id}"}}]"#)).await;
    let store = RestStore::new(url, "anon");

    store.create_session(user(), None).await.unwrap();

    let body = backend.await.unwrap().json();
    assert!(body.get("kiosk_id").is_none());
}

#[tokio::test]
async fn test_create_session_with_empty_insert_fails() {
    let (url, backend) = serve_once("201 Created", "[]").await;
    let store = RestStore::new(url, "anon");

    let err = store.create_session(user(), None).await.unwrap_err();
    assert!(
        matches!(&err, Error::UnexpectedResponse(msg) if msg.contains("no rows")),
        "unexpected error: {err:?}"
    );
    backend.await.unwrap();
}

#[tokio::test]
async fn test_close_session_rejected_uses_reason_phrase() {
    let (url, backend) = serve_once("401 Unauthorized", "").await;
    let store = RestStore::new(url, "anon").with_access_token("user-token");
    let id = SessionId::new();

    let err = store.close_session(id, Utc::now()).await.unwrap_err();
    assert!(
        matches!(&err, Error::Backend { status: 401, message } if message == "Unauthorized"),
        "unexpected error: {err:?}"
    );

    let request = backend.await.unwrap();
    assert_eq!(
        request.request_line,
        format!("PATCH /rest/v1/kiosk_sessions?id=eq.{id} HTTP/1.1")
    );
    assert_eq!(request.header("apikey"), Some("anon"));
    assert_eq!(request.header("authorization"), Some("Bearer user-token"));
    assert_eq!(request.header("prefer"), Some("return=minimal"));

    let body = request.json();
    assert_eq!(body["status"], "completed");
    assert!(body["ended_at"].is_string());
}

#[tokio::test]
async fn test_backend_error_body_becomes_message() {
    let (url, backend) = serve_once(
        "409 Conflict",
        r#"{"message":"insert or update violates foreign key constraint"}"#,
    )
    .await;
    let store = RestStore::new(url, "anon");

    let err = store
        .append_activity_log(NewActivityLog {
            session_id: Some(SessionId::new()),
            user_id: user(),
            action_type: "view_bill".to_string(),
            department: Some("electricity".to_string()),
            details: ActivityDetails::new(),
        })
        .await
        .unwrap_err();
    assert!(
        matches!(&err, Error::Backend { status: 409, message } if message.contains("foreign key")),
        "unexpected error: {err:?}"
    );

    let request = backend.await.unwrap();
    assert_eq!(request.request_line, "POST /rest/v1/kiosk_activity_logs HTTP/1.1");
    let body = request.json();
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["action_type"], "view_bill");
    assert_eq!(body[0]["department"], "electricity");
}

#[tokio::test]
async fn test_recent_sessions_query_and_rows() {
    let open = SessionId::new();
    let closed = SessionId::new();
    let rows = format!(
        r#"[
            {{"id":"{open}","user_id":null,"kiosk_id":"default","department":null,
              "started_at":"2026-03-01T10:05:00Z","ended_at":null,"status":"active",
              "actions_count":null}},
            {{"id":"{closed}","user_id":"{user}","kiosk_id":"lobby-01","department":"gas",
              "started_at":"2026-03-01T09:00:00Z","ended_at":"2026-03-01T09:03:00Z",
              "status":"completed","actions_count":4}}
        ]"#,
        user = user()
    );
    let (url, backend) = serve_once("200 OK", &rows).await;
    let store = RestStore::new(url, "anon");

    let sessions = store.recent_sessions(50).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, open);
    assert_eq!(sessions[0].status, SessionStatus::Active);
    assert_eq!(sessions[0].actions_count, 0);
    assert_eq!(sessions[1].id, closed);
    assert_eq!(sessions[1].status, SessionStatus::Completed);
    assert_eq!(sessions[1].actions_count, 4);
    assert!(sessions[1].ended_at.is_some());

    let request = backend.await.unwrap();
    assert_eq!(
        request.request_line,
        "GET /rest/v1/kiosk_sessions?select=*&order=started_at.desc&limit=50 HTTP/1.1"
    );
    assert_eq!(request.header("apikey"), Some("anon"));
}
