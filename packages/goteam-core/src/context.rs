/// Board context: the single owner of the live board, its members and the
/// active window.
///
/// UI code reads [`BoardSnapshot`]s (directly or via [`BoardContext::subscribe`])
/// and requests changes through the methods here; nothing else can write the
/// state. Every change replaces the whole snapshot in one step.
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::board::BoardError;
use crate::mutation::{Optimistic, Settled};
use crate::notify::Notifier;
use crate::remote::{BoardRemote, NewTask, RemoteError, TaskPosition};
use crate::session::{Session, SessionStore};
use crate::types::{ActiveWindow, Board, ColumnOrder, Identifier, Member, Task};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("No board is loaded")]
    NoBoard,
}

impl ContextError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ContextError::Board(err) => err.is_not_found(),
            ContextError::Remote(RemoteError::NotFound(_)) => true,
            ContextError::Remote(_) => false,
            ContextError::NoBoard => true,
        }
    }

    /// Field and message of a remote validation error, for inline display.
    pub fn validation(&self) -> Option<(&str, &str)> {
        match self {
            ContextError::Remote(RemoteError::Validation { field, message }) => Some((field.as_str(), message.as_str())),
            _ => None,
        }
    }
}

/// Everything the UI renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub board: Board,
    pub members: Vec<Member>,
    pub active_window: ActiveWindow,
}

pub struct BoardContext {
    remote: Arc<dyn BoardRemote>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionStore>,
    state: watch::Sender<BoardSnapshot>,
}

/// Structural errors mean the caller asked for something the board cannot
/// hold. They are logged loudly and never trigger a remote call.
fn structural(err: BoardError) -> ContextError {
    log::error!("[goteam.context] Rejected board operation: {}", err);
    ContextError::Board(err)
}

impl BoardContext {
    /// Start with the empty board, no members and no open window.
    pub fn new(
        remote: Arc<dyn BoardRemote>,
        notifier: Arc<dyn Notifier>,
        session: Arc<SessionStore>,
    ) -> Self {
        let (state, _) = watch::channel(BoardSnapshot::default());
        Self {
            remote,
            notifier,
            session,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.state.borrow().clone()
    }

    pub fn board(&self) -> Board {
        self.state.borrow().board.clone()
    }

    pub fn board_id(&self) -> Option<Identifier> {
        self.state.borrow().board.id
    }

    pub fn members(&self) -> Vec<Member> {
        self.state.borrow().members.clone()
    }

    pub fn active_window(&self) -> ActiveWindow {
        self.state.borrow().active_window
    }

    pub fn session(&self) -> Option<Session> {
        self.session.get()
    }

    fn publish<F: FnOnce(&mut BoardSnapshot)>(&self, update: F) {
        self.state.send_modify(update);
    }

    fn publish_board(&self, board: Board) {
        self.publish(|snapshot| snapshot.board = board);
    }

    fn publish_members(&self, members: Vec<Member>) {
        self.publish(|snapshot| snapshot.members = members);
    }

    pub fn notify(&self, title: &str, message: &str) {
        self.notifier.notify(title, message);
    }

    /// Report a failed remote call. Validation errors are left to the form
    /// that submitted the value.
    fn surface(&self, title: &str, error: &RemoteError) {
        if !error.is_validation() {
            self.notify(title, &error.to_string());
        }
    }

    pub fn set_members(&self, members: Vec<Member>) {
        self.publish_members(members);
    }

    pub fn set_active_window(&self, window: ActiveWindow) {
        self.publish(|snapshot| snapshot.active_window = window);
    }

    /// Open `window`, or close it if it is the one already open.
    pub fn toggle_window(&self, window: ActiveWindow) {
        self.publish(|snapshot| snapshot.active_window = snapshot.active_window.toggled(window));
    }

    pub fn start_session(&self, session: Session) {
        self.session.store(session);
    }

    /// Ask the remote whether the stored credentials are still good. No stored
    /// session counts as invalid.
    pub async fn verify_session(&self) -> Result<bool, ContextError> {
        let Some(session) = self.session.get() else {
            return Ok(false);
        };
        let status = self
            .remote
            .verify_token(&session.username, &session.auth_token)
            .await?;
        if !status.valid {
            log::info!("[goteam.context] Token for {} was rejected", session.username);
        }
        Ok(status.valid)
    }

    /// Drop the session and return to the initial empty state.
    pub fn logout(&self) {
        self.session.clear();
        self.state.send_replace(BoardSnapshot::default());
        log::info!("[goteam.context] Logged out");
    }

    /// Fetch a board and replace the held one wholesale. Without an id the
    /// currently held board is reloaded. On any failure the held board stays.
    pub async fn load_board(&self, board_id: Option<Identifier>) -> Result<(), ContextError> {
        let board_id = board_id.or(self.board_id()).ok_or(ContextError::NoBoard)?;
        let record = self.remote.fetch_board(board_id).await.map_err(|err| {
            log::warn!("[goteam.context] Failed to load board {}: {}", board_id, err);
            err
        })?;
        let members = record.members.clone();
        let board = Board::try_from(record).map_err(|err| {
            log::warn!("[goteam.context] Failed to load board {}: {}", board_id, err);
            ContextError::Board(err)
        })?;
        log::info!(
            "[goteam.context] Loaded board {} ({} tasks, {} members)",
            board_id,
            board.task_count(),
            members.len()
        );
        self.publish(|snapshot| {
            snapshot.board = board;
            snapshot.members = members;
        });
        Ok(())
    }

    /// Create a board and switch to it. Nothing changes locally until the
    /// remote assigns the id.
    pub async fn create_board(&self, name: &str, team_id: Identifier) -> Result<Identifier, ContextError> {
        let pending = Optimistic::unchanged(&self.board());
        let outcome = self.remote.create_board(name, team_id).await;
        match pending.settle(self.board(), outcome, |_, created| {
            Board::created(created.id, created.name)
        }) {
            Settled::Reconciled(board) => {
                let board_id = board.id.ok_or(ContextError::NoBoard)?;
                log::info!("[goteam.context] Created board {} ({})", board_id, board.name);
                self.publish_board(board);
                if let Err(err) = self.load_board(Some(board_id)).await {
                    self.notify("Unable to load board.", &err.to_string());
                }
                Ok(board_id)
            }
            Settled::RolledBack { error, .. } => {
                log::warn!("[goteam.context] Board creation failed: {}", error);
                self.surface("Board creation failure.", &error);
                Err(error.into())
            }
        }
    }

    /// Rename the held board. The new name is only published once the remote
    /// accepts it; a rejected name comes back as a validation error.
    pub async fn rename_board(&self, name: &str) -> Result<(), ContextError> {
        let current = self.board();
        let board_id = current.id.ok_or(ContextError::NoBoard)?;
        let pending = Optimistic::unchanged(&current);
        let outcome = self.remote.rename_board(board_id, name).await;
        match pending.settle(self.board(), outcome, |mut board, ()| {
            // The user may have switched boards meanwhile
            if board.id == Some(board_id) {
                board.name = name.to_string();
            }
            board
        }) {
            Settled::Reconciled(board) => {
                self.publish_board(board);
                Ok(())
            }
            Settled::RolledBack { error, .. } => {
                log::warn!("[goteam.context] Rename of board {} failed: {}", board_id, error);
                self.surface("Unable to rename board.", &error);
                Err(error.into())
            }
        }
    }

    /// Move a task (drag-and-drop). Published immediately, then every affected
    /// column is persisted; any remote failure restores the board as it was.
    /// If a column was saved before the failure the board is reloaded.
    pub async fn move_task(
        &self,
        task_id: Identifier,
        target: ColumnOrder,
        index: usize,
    ) -> Result<(), ContextError> {
        let current = self.board();
        let (source, _) = current.locate_task(task_id).map_err(structural)?;
        let pending = Optimistic::apply(&current, |board| board.move_task(task_id, target, index))
            .map_err(structural)?;

        let mut updates = vec![pending.applied().column_positions(target).map_err(structural)?];
        if source != target {
            updates.push(pending.applied().column_positions(source).map_err(structural)?);
        }

        self.publish_board(pending.applied().clone());
        log::debug!(
            "[goteam.context] Moved task {} from {} to {}[{}]",
            task_id,
            source,
            target,
            index
        );

        let (accepted, outcome) = self.persist_columns(&updates).await;
        let result = self.settle_board(pending, outcome, "Unable to move task.");
        if result.is_err() && accepted > 0 {
            // Some columns were already saved, so the rollback alone no
            // longer matches the remote
            if let Err(err) = self.load_board(None).await {
                log::warn!("[goteam.context] Reload after partial move failed: {}", err);
            }
        }
        result
    }

    /// Persist column orders one at a time. Returns how many the remote
    /// accepted before the first failure.
    async fn persist_columns(&self, updates: &[(Identifier, Vec<TaskPosition>)]) -> (usize, Result<(), RemoteError>) {
        for (accepted, (column_id, tasks)) in updates.iter().enumerate() {
            if let Err(err) = self.remote.update_column(*column_id, tasks).await {
                return (accepted, Err(err));
            }
        }
        (updates.len(), Ok(()))
    }

    /// Create a task at the end of a column. Appears once the remote has
    /// assigned its id.
    pub async fn create_task(
        &self,
        title: &str,
        description: &str,
        order: ColumnOrder,
    ) -> Result<Identifier, ContextError> {
        let current = self.board();
        let column = current.find_column(order).map_err(structural)?;
        let column_id = column
            .id
            .ok_or(BoardError::UnsavedColumn(order))
            .map_err(structural)?;
        let request = NewTask {
            title: title.to_string(),
            description: description.to_string(),
            column_id,
            order: column.tasks.len(),
        };

        let pending = Optimistic::unchanged(&current);
        let outcome = self.remote.create_task(&request).await.map(|created| created.id);
        let task_id = outcome.as_ref().ok().copied();
        match pending.settle(self.board(), outcome, |board, id| {
            let mut task = Task::new(id, title);
            task.description = description.to_string();
            let end = board.find_column(order).map(|column| column.tasks.len()).unwrap_or(0);
            match board.insert_task(task, order, end) {
                Ok(next) => next,
                Err(err) => {
                    // Already there, e.g. a reload landed first
                    log::debug!("[goteam.context] Skipped local insert: {}", err);
                    board
                }
            }
        }) {
            Settled::Reconciled(board) => {
                self.publish_board(board);
                task_id.ok_or(ContextError::NoBoard)
            }
            Settled::RolledBack { error, .. } => {
                log::warn!("[goteam.context] Task creation failed: {}", error);
                self.surface("Unable to create task.", &error);
                Err(error.into())
            }
        }
    }

    pub async fn delete_task(&self, task_id: Identifier) -> Result<(), ContextError> {
        let pending = Optimistic::apply(&self.board(), |board| board.remove_task(task_id))
            .map_err(structural)?;
        self.publish_board(pending.applied().clone());
        let outcome = self.remote.delete_task(task_id).await;
        self.settle_board(pending, outcome, "Unable to delete task.")
    }

    fn settle_board(
        &self,
        pending: Optimistic<Board>,
        outcome: Result<(), RemoteError>,
        failure_title: &str,
    ) -> Result<(), ContextError> {
        match pending.confirm(self.board(), outcome) {
            Settled::Reconciled(board) => {
                self.publish_board(board);
                Ok(())
            }
            Settled::RolledBack { state, error } => {
                log::warn!("[goteam.context] {} Rolling back: {}", failure_title, error);
                self.publish_board(state);
                self.surface(failure_title, &error);
                Err(error.into())
            }
        }
    }

    /// Remove a member. The member disappears from the published list right
    /// away, and the board is reloaded afterwards whatever the remote says,
    /// since a stale member list is worse than a brief flicker.
    pub async fn delete_member(&self, username: &str) -> Result<(), ContextError> {
        let pending = Optimistic::map(&self.members(), |members| {
            members
                .iter()
                .filter(|member| member.username != username)
                .cloned()
                .collect()
        });
        self.publish_members(pending.applied().clone());

        let outcome = self.remote.delete_user(username).await;
        let result = match pending.confirm(self.members(), outcome) {
            Settled::Reconciled(members) => {
                self.publish_members(members);
                Ok(())
            }
            Settled::RolledBack { state, error } => {
                log::warn!("[goteam.context] Failed to delete member {}: {}", username, error);
                self.publish_members(state);
                self.notify("Unable to delete member.", &format!("{}.", error));
                Err(error.into())
            }
        };

        if let Err(err) = self.load_board(None).await {
            log::warn!("[goteam.context] Reload after member deletion failed: {}", err);
        }
        result
    }
}
