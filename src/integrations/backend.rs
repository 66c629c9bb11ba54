use crate::config::ServerConfig;
use crate::models::Task;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::redirect::Policy;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const SESSION_EXPIRED: &str = "Session expired, log in again.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Blank input rejected before any request is made.
    #[error("validation failed: {0}")]
    Validation(&'static str),
    #[error("{0}")]
    Application(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Text shown to the user. Validation failures are silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            GatewayError::Validation(_) => None,
            GatewayError::Application(msg) => Some(msg.clone()),
            GatewayError::Transport(detail) => Some(format!("Network error: {detail}")),
            GatewayError::Decode(detail) => Some(format!("Unexpected response: {detail}")),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

pub trait TaskGateway: Send + Sync {
    fn create_task(&self, content: &str) -> Result<Task, GatewayError>;
    fn update_task(&self, id: &str, content: &str, completed: bool)
    -> Result<Task, GatewayError>;
    fn delete_task(&self, id: &str) -> Result<(), GatewayError>;
    fn sync_tasks(&self) -> Result<Vec<Task>, GatewayError>;
    fn sort_tasks(&self) -> Result<Vec<Task>, GatewayError>;
    fn logout(&self) -> Result<(), GatewayError>;
}

#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    task: Option<Task>,
    #[serde(default)]
    tasks: Option<Vec<Task>>,
}

impl Envelope {
    fn into_success(self) -> Result<Envelope, GatewayError> {
        if self.status == "success" {
            return Ok(self);
        }
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());
        Err(GatewayError::Application(message))
    }

    fn into_task(self) -> Result<Task, GatewayError> {
        self.into_success()?
            .task
            .ok_or_else(|| GatewayError::Decode("missing task".to_string()))
    }

    fn into_tasks(self) -> Result<Vec<Task>, GatewayError> {
        self.into_success()?
            .tasks
            .ok_or_else(|| GatewayError::Decode("missing tasks".to_string()))
    }
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &ServerConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder().redirect(Policy::none());
        builder = if config.timeout_seconds == 0 {
            builder.timeout(None)
        } else {
            builder.timeout(Duration::from_secs(config.timeout_seconds))
        };
        let client = builder
            .build()
            .map_err(|err| GatewayError::Transport(format!("failed to create HTTP client: {err}")))?;

        let session_cookie = Some(config.session_cookie.trim())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_cookie,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.client.post(format!("{}{}", self.base_url, path));
        self.with_session(request)
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session_cookie.as_deref() {
            Some(value) => request.header(COOKIE, format!("session={value}")),
            None => request,
        }
    }

    fn send(&self, path: &str, request: RequestBuilder) -> Result<Envelope, GatewayError> {
        debug!(path, "sending request");
        let response = request.send()?;
        decode_envelope(path, response)
    }

    fn post_json(&self, path: &str) -> Result<Envelope, GatewayError> {
        let request = self.post(path).header(CONTENT_TYPE, "application/json");
        self.send(path, request)
    }
}

fn decode_envelope(path: &str, response: Response) -> Result<Envelope, GatewayError> {
    let status = response.status();
    if status.is_redirection() {
        // Expired sessions are bounced to the login page.
        warn!(path, %status, "request redirected, session likely expired");
        return Err(GatewayError::Application(SESSION_EXPIRED.to_string()));
    }
    if !status.is_success() {
        warn!(path, %status, "request rejected");
        return Err(GatewayError::Transport(format!("HTTP {}", status.as_u16())));
    }
    let body = response.text()?;
    serde_json::from_str::<Envelope>(&body).map_err(|err| {
        warn!(path, error = %err, "undecodable response body");
        GatewayError::Decode(err.to_string())
    })
}

fn validated(content: &str) -> Result<&str, GatewayError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::Validation("task content is blank"));
    }
    Ok(trimmed)
}

impl TaskGateway for HttpGateway {
    fn create_task(&self, content: &str) -> Result<Task, GatewayError> {
        let content = validated(content)?;
        let request = self.post("/add-task").form(&[("task", content)]);
        self.send("/add-task", request)?.into_task()
    }

    fn update_task(
        &self,
        id: &str,
        content: &str,
        completed: bool,
    ) -> Result<Task, GatewayError> {
        let content = validated(content)?;
        let completed = if completed { "true" } else { "false" };
        let request = self.post("/update-task").form(&[
            ("id", id),
            ("content", content),
            ("completed", completed),
        ]);
        self.send("/update-task", request)?.into_task()
    }

    fn delete_task(&self, id: &str) -> Result<(), GatewayError> {
        let request = self.post("/delete-task").form(&[("id", id)]);
        self.send("/delete-task", request)?.into_success()?;
        Ok(())
    }

    fn sync_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        self.post_json("/sync-tasks")?.into_tasks()
    }

    fn sort_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        self.post_json("/magic-sort")?.into_tasks()
    }

    fn logout(&self) -> Result<(), GatewayError> {
        let request = self.with_session(self.client.get(format!("{}/logout", self.base_url)));
        // The server answers with a redirect to the login page.
        request.send()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quadrant;
    use mockito::Matcher;

    fn gateway_for(server: &mockito::Server) -> HttpGateway {
        let config = ServerConfig {
            base_url: server.url(),
            timeout_seconds: 5,
            session_cookie: String::new(),
            sync_on_start: false,
        };
        HttpGateway::new(&config).expect("gateway")
    }

    #[test]
    fn create_task_posts_form_and_returns_server_task() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/add-task")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::UrlEncoded("task".into(), "Buy milk".into()))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"success","task":{"id":"u-1","content":"Buy milk","completed":false}}"#,
            )
            .create();

        let task = gateway_for(&server).create_task("  Buy milk ").expect("created");
        assert_eq!(task.id, "u-1");
        assert_eq!(task.content, "Buy milk");
        assert!(!task.completed);
        mock.assert();
    }

    #[test]
    fn blank_create_sends_nothing() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/add-task").expect(0).create();

        let err = gateway_for(&server).create_task("   \t").expect_err("blank");
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(err.user_message(), None);
        mock.assert();
    }

    #[test]
    fn update_sends_every_field() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/update-task")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "u-1".into()),
                Matcher::UrlEncoded("content".into(), "Buy milk".into()),
                Matcher::UrlEncoded("completed".into(), "true".into()),
            ]))
            .with_body(
                r#"{"status":"success","task":{"id":"u-1","content":"Buy milk","completed":true}}"#,
            )
            .create();

        let task = gateway_for(&server)
            .update_task("u-1", "Buy milk", true)
            .expect("updated");
        assert!(task.completed);
        mock.assert();
    }

    #[test]
    fn non_success_status_surfaces_server_message() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/delete-task")
            .with_body(r#"{"status":"error","message":"Task not found"}"#)
            .create();

        let err = gateway_for(&server).delete_task("nope").expect_err("error");
        assert_eq!(err, GatewayError::Application("Task not found".to_string()));
        assert_eq!(err.user_message().as_deref(), Some("Task not found"));
    }

    #[test]
    fn missing_message_falls_back() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/magic-sort")
            .with_body(r#"{"status":"error"}"#)
            .create();

        let err = gateway_for(&server).sort_tasks().expect_err("error");
        assert_eq!(err, GatewayError::Application("Unknown error".to_string()));
    }

    #[test]
    fn http_failure_is_a_transport_error() {
        let mut server = mockito::Server::new();
        server.mock("POST", "/sync-tasks").with_status(500).create();

        let err = gateway_for(&server).sync_tasks().expect_err("error");
        assert_eq!(err, GatewayError::Transport("HTTP 500".to_string()));
        assert_eq!(err.user_message().as_deref(), Some("Network error: HTTP 500"));
    }

    #[test]
    fn login_redirect_reports_expired_session() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/add-task")
            .with_status(302)
            .with_header("location", "/login")
            .create();

        let err = gateway_for(&server).create_task("Buy milk").expect_err("error");
        assert_eq!(err, GatewayError::Application(SESSION_EXPIRED.to_string()));
        assert_eq!(err.user_message().as_deref(), Some(SESSION_EXPIRED));
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let config = ServerConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 2,
            session_cookie: String::new(),
            sync_on_start: false,
        };
        let err = HttpGateway::new(&config)
            .expect("gateway")
            .sync_tasks()
            .expect_err("error");
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[test]
    fn sync_and_sort_use_json_header_and_return_tasks() {
        let mut server = mockito::Server::new();
        let sync = server
            .mock("POST", "/sync-tasks")
            .match_header("content-type", "application/json")
            .with_body(
                r#"{"status":"success","message":"Tasks synced successfully","fileId":"f","tasks":[
                    {"id":"A","content":"a","completed":false,"quadrant":null},
                    {"id":"B","content":"b","completed":true}
                ]}"#,
            )
            .create();
        let sort = server
            .mock("POST", "/magic-sort")
            .match_header("content-type", "application/json")
            .with_body(
                r#"{"status":"success","tasks":[
                    {"id":"A","content":"a","completed":false,"quadrant":"Q1","urgency":5,"importance":4}
                ]}"#,
            )
            .create();

        let gateway = gateway_for(&server);
        let synced = gateway.sync_tasks().expect("synced");
        assert_eq!(synced.len(), 2);
        let sorted = gateway.sort_tasks().expect("sorted");
        assert_eq!(sorted[0].quadrant, Some(Quadrant::Q1));
        sync.assert();
        sort.assert();
    }

    #[test]
    fn success_without_payload_is_a_decode_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/add-task")
            .with_body(r#"{"status":"success"}"#)
            .create();

        let err = gateway_for(&server).create_task("x").expect_err("error");
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn session_cookie_is_attached() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/delete-task")
            .match_header("cookie", "session=abc123")
            .with_body(r#"{"status":"success"}"#)
            .create();

        let config = ServerConfig {
            base_url: format!("{}/", server.url()),
            timeout_seconds: 5,
            session_cookie: " abc123 ".to_string(),
            sync_on_start: false,
        };
        HttpGateway::new(&config)
            .expect("gateway")
            .delete_task("u-1")
            .expect("deleted");
        mock.assert();
    }

    #[test]
    fn logout_accepts_redirect() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/logout")
            .with_status(302)
            .with_header("location", "/login")
            .create();

        gateway_for(&server).logout().expect("logged out");
        mock.assert();
    }
}
