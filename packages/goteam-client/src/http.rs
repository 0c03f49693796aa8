/// HTTP implementation of the board remote.
///
/// Talks JSON to the goteam REST backend. Every request carries the stored
/// session in the `auth-user` / `auth-token` headers. Non-success responses
/// are mapped onto `RemoteError`:
/// - 400 with a `{field: message}` or `{field: [messages]}` body -> Validation
/// - 401 / 403 -> Unauthorized
/// - 404 -> NotFound
/// - anything else, including transport failures -> Remote
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use goteam_core::remote::{
    BoardRecord, BoardRemote, CreatedBoard, CreatedTask, NewTask, RemoteError, TaskPosition, TokenStatus,
};
use goteam_core::session::SessionStore;
use goteam_core::types::Identifier;

use crate::config::ClientConfig;

pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

/// Board creation answers with `board_id` on older backends.
#[derive(Deserialize)]
struct CreateBoardResponse {
    #[serde(alias = "board_id")]
    id: Identifier,
    #[serde(default)]
    name: Option<String>,
}

impl HttpRemote {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RemoteError::Remote(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.get() {
            Some(session) => builder
                .header("auth-user", session.username)
                .header("auth-token", session.auth_token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, RemoteError> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| RemoteError::Remote(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        log::warn!("[goteam.http] {} returned {}: {}", what, status, body);
        Err(error_from_status(status.as_u16(), &body))
    }

    async fn json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, RemoteError> {
        response
            .json()
            .await
            .map_err(|e| RemoteError::Remote(format!("Parse {} response: {}", what, e)))
    }
}

fn user_path(username: &str) -> String {
    format!("users/{}", utf8_percent_encode(username, NON_ALPHANUMERIC))
}

/// Map a failed response onto the error taxonomy.
pub fn error_from_status(status: u16, body: &str) -> RemoteError {
    match status {
        400 => parse_field_error(body)
            .unwrap_or_else(|| RemoteError::Remote(format!("Bad request: {}", body.trim()))),
        401 | 403 => RemoteError::Unauthorized(
            first_message(body).unwrap_or_else(|| "Authentication failure.".to_string()),
        ),
        404 => RemoteError::NotFound(first_message(body).unwrap_or_else(|| "Not found.".to_string())),
        _ => RemoteError::Remote(format!("Server Error ({})", status)),
    }
}

fn parse_field_error(body: &str) -> Option<RemoteError> {
    let (field, message) = first_field(body)?;
    if field == "error" || field == "detail" {
        return Some(RemoteError::Remote(message));
    }
    Some(RemoteError::validation(field, message))
}

fn first_message(body: &str) -> Option<String> {
    first_field(body).map(|(_, message)| message)
}

/// First field of an error body, in the order the server sent them.
fn first_field(body: &str) -> Option<(String, String)> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let (field, detail) = value.as_object()?.iter().next()?;
    let message = match detail {
        serde_json::Value::String(message) => message.clone(),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|item| item.as_str()).collect();
            if parts.is_empty() {
                return None;
            }
            parts.join(" ")
        }
        _ => return None,
    };
    Some((field.clone(), message))
}

#[async_trait]
impl BoardRemote for HttpRemote {
    async fn create_board(&self, name: &str, team_id: Identifier) -> Result<CreatedBoard, RemoteError> {
        let body = serde_json::json!({ "name": name, "team_id": team_id });
        let response = self
            .send(self.client.post(self.url("boards/")).json(&body), "Create board")
            .await?;
        let created: CreateBoardResponse = Self::json(response, "create board").await?;
        log::info!("[goteam.http] Created board {}", created.id);
        Ok(CreatedBoard {
            id: created.id,
            name: created.name.unwrap_or_else(|| name.to_string()),
        })
    }

    async fn rename_board(&self, board_id: Identifier, name: &str) -> Result<(), RemoteError> {
        let body = serde_json::json!({ "name": name });
        self.send(
            self.client
                .patch(self.url("boards/"))
                .query(&[("id", board_id.0)])
                .json(&body),
            "Rename board",
        )
        .await?;
        Ok(())
    }

    async fn fetch_board(&self, board_id: Identifier) -> Result<BoardRecord, RemoteError> {
        let response = self
            .send(
                self.client.get(self.url("boards/")).query(&[("id", board_id.0)]),
                "Fetch board",
            )
            .await?;
        Self::json(response, "fetch board").await
    }

    async fn update_column(&self, column_id: Identifier, tasks: &[TaskPosition]) -> Result<(), RemoteError> {
        self.send(
            self.client
                .patch(self.url("columns/"))
                .query(&[("id", column_id.0)])
                .json(tasks),
            "Update column",
        )
        .await?;
        Ok(())
    }

    async fn create_task(&self, task: &NewTask) -> Result<CreatedTask, RemoteError> {
        let response = self
            .send(self.client.post(self.url("tasks/")).json(task), "Create task")
            .await?;
        Self::json(response, "create task").await
    }

    async fn delete_task(&self, task_id: Identifier) -> Result<(), RemoteError> {
        self.send(
            self.client.delete(self.url("tasks/")).query(&[("id", task_id.0)]),
            "Delete task",
        )
        .await?;
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> Result<(), RemoteError> {
        self.send(self.client.delete(self.url(&user_path(username))), "Delete user")
            .await?;
        log::info!("[goteam.http] Deleted user {}", username);
        Ok(())
    }

    async fn verify_token(&self, username: &str, token: &str) -> Result<TokenStatus, RemoteError> {
        let body = serde_json::json!({ "username": username, "token": token });
        let request = self.client.post(self.url("verify-token/")).json(&body);
        match self.send(request, "Verify token").await {
            Ok(response) => Self::json(response, "verify token").await,
            // The backend answers a bad token with an auth failure
            Err(RemoteError::Unauthorized(_)) => Ok(TokenStatus { valid: false }),
            Err(e) => Err(e),
        }
    }
}
