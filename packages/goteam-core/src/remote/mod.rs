#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{ColumnOrder, Identifier, Member};

/// Remote authority for boards, columns, tasks and users.
///
/// The board held in memory is a cache of what this side records. The HTTP
/// implementation lives in the client crate; tests use an in-memory fake.
#[async_trait]
pub trait BoardRemote: Send + Sync {
    /// Create a board for a team. Field-level rejections (e.g. a taken name)
    /// come back as [`RemoteError::Validation`].
    async fn create_board(&self, name: &str, team_id: Identifier) -> Result<CreatedBoard, RemoteError>;

    async fn rename_board(&self, board_id: Identifier, name: &str) -> Result<(), RemoteError>;

    /// Fetch the full board tree plus its member list.
    async fn fetch_board(&self, board_id: Identifier) -> Result<BoardRecord, RemoteError>;

    /// Record the order of every task in a column. Tasks not yet in the
    /// column are moved into it.
    async fn update_column(
        &self,
        column_id: Identifier,
        tasks: &[TaskPosition],
    ) -> Result<(), RemoteError>;

    async fn create_task(&self, task: &NewTask) -> Result<CreatedTask, RemoteError>;

    async fn delete_task(&self, task_id: Identifier) -> Result<(), RemoteError>;

    async fn delete_user(&self, username: &str) -> Result<(), RemoteError>;

    async fn verify_token(&self, username: &str, token: &str) -> Result<TokenStatus, RemoteError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Field-level rejection, shown next to the offending input.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failure: {0}")]
    Unauthorized(String),

    /// Transport or server failure without structured field data.
    #[error("{0}")]
    Remote(String),
}

impl RemoteError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RemoteError::Validation { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedBoard {
    pub id: Identifier,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub id: Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatus {
    pub valid: bool,
}

/// Board tree as returned by the remote fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub id: Identifier,
    #[serde(default)]
    pub name: String,
    pub columns: Vec<ColumnRecord>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    #[serde(default)]
    pub id: Option<Identifier>,
    pub order: ColumnOrder,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Identifier,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub position: usize,
}

/// One `{id, order}` entry of a column update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPosition {
    pub id: Identifier,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    #[serde(rename = "column")]
    pub column_id: Identifier,
    pub order: usize,
}
