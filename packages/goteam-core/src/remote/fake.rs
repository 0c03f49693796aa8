/// In-memory stand-in for the remote authority, used by tests.
///
/// Each call yields once before doing anything, so a test can observe what
/// was published while the call is "in flight". Failures are scripted per
/// operation name with [`FakeRemote::fail_next`].
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::notify::Notifier;

#[derive(Default)]
struct FakeState {
    boards: HashMap<Identifier, BoardRecord>,
    failures: HashMap<&'static str, VecDeque<Option<RemoteError>>>,
    tokens: HashMap<String, String>,
    calls: Vec<String>,
    next_id: u64,
}

pub(crate) struct FakeRemote {
    state: Mutex<FakeState>,
}

/// Board 1 "Sprint 1": columns 100..=103, `INBOX = [10@0, 11@1]`, members
/// alice and bob.
pub(crate) fn sample_record() -> BoardRecord {
    BoardRecord {
        id: Identifier(1),
        name: "Sprint 1".to_string(),
        columns: ColumnOrder::ALL
            .iter()
            .zip(100..)
            .map(|(&order, id)| ColumnRecord {
                id: Some(Identifier(id)),
                order,
                tasks: Vec::new(),
            })
            .map(|mut column| {
                if column.order == ColumnOrder::Inbox {
                    column.tasks = vec![
                        TaskRecord {
                            id: Identifier(10),
                            title: "A".to_string(),
                            description: String::new(),
                            position: 0,
                        },
                        TaskRecord {
                            id: Identifier(11),
                            title: "B".to_string(),
                            description: String::new(),
                            position: 1,
                        },
                    ];
                }
                column
            })
            .collect(),
        members: vec![Member::new("alice"), Member::new("bob")],
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1000,
                ..FakeState::default()
            }),
        }
    }

    pub fn with_board(record: BoardRecord) -> Self {
        let fake = Self::new();
        fake.insert_board(record);
        fake
    }

    /// Ids handed out from now on start at `first`.
    pub fn starting_ids(self, first: u64) -> Self {
        self.lock().next_id = first;
        self
    }

    pub fn insert_board(&self, record: BoardRecord) {
        self.lock().boards.insert(record.id, record);
    }

    pub fn fail_next(&self, op: &'static str, error: RemoteError) {
        self.lock().failures.entry(op).or_default().push_back(Some(error));
    }

    /// Let the next scripted call of `op` through, so a later
    /// [`FakeRemote::fail_next`] hits a later call.
    pub fn pass_next(&self, op: &'static str) {
        self.lock().failures.entry(op).or_default().push_back(None);
    }

    pub fn accept_token(&self, username: &str, token: &str) {
        self.lock().tokens.insert(username.to_string(), token.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(op))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    async fn begin(&self, op: &'static str, detail: String) -> Result<std::sync::MutexGuard<'_, FakeState>, RemoteError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.push(format!("{} {}", op, detail));
        match state.failures.get_mut(op).and_then(|queue| queue.pop_front()).flatten() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

impl FakeState {
    fn allocate(&mut self) -> Identifier {
        let id = Identifier(self.next_id);
        self.next_id += 1;
        id
    }

    fn board_with_column(&mut self, column_id: Identifier) -> Result<&mut BoardRecord, RemoteError> {
        self.boards
            .values_mut()
            .find(|board| board.columns.iter().any(|c| c.id == Some(column_id)))
            .ok_or_else(|| RemoteError::NotFound(format!("column {}", column_id)))
    }
}

fn take_task(board: &mut BoardRecord, task_id: Identifier) -> Option<TaskRecord> {
    board.columns.iter_mut().find_map(|column| {
        let index = column.tasks.iter().position(|task| task.id == task_id)?;
        Some(column.tasks.remove(index))
    })
}

#[async_trait]
impl BoardRemote for FakeRemote {
    async fn create_board(&self, name: &str, _team_id: Identifier) -> Result<CreatedBoard, RemoteError> {
        let mut state = self.begin("create_board", name.to_string()).await?;
        if state.boards.values().any(|board| board.name == name) {
            return Err(RemoteError::validation("name", "Board name is taken."));
        }
        let id = state.allocate();
        let columns = ColumnOrder::ALL
            .iter()
            .map(|&order| ColumnRecord {
                id: Some(state.allocate()),
                order,
                tasks: Vec::new(),
            })
            .collect();
        state.boards.insert(
            id,
            BoardRecord {
                id,
                name: name.to_string(),
                columns,
                members: Vec::new(),
            },
        );
        Ok(CreatedBoard {
            id,
            name: name.to_string(),
        })
    }

    async fn rename_board(&self, board_id: Identifier, name: &str) -> Result<(), RemoteError> {
        let mut state = self.begin("rename_board", format!("{} {}", board_id, name)).await?;
        let board = state
            .boards
            .get_mut(&board_id)
            .ok_or_else(|| RemoteError::NotFound(format!("board {}", board_id)))?;
        board.name = name.to_string();
        Ok(())
    }

    async fn fetch_board(&self, board_id: Identifier) -> Result<BoardRecord, RemoteError> {
        let state = self.begin("fetch_board", board_id.to_string()).await?;
        state
            .boards
            .get(&board_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("board {}", board_id)))
    }

    async fn update_column(&self, column_id: Identifier, tasks: &[TaskPosition]) -> Result<(), RemoteError> {
        let mut state = self.begin("update_column", column_id.to_string()).await?;
        let board = state.board_with_column(column_id)?;
        for position in tasks {
            let mut task = take_task(board, position.id)
                .ok_or_else(|| RemoteError::NotFound(format!("task {}", position.id)))?;
            task.position = position.order;
            if let Some(column) = board.columns.iter_mut().find(|c| c.id == Some(column_id)) {
                column.tasks.push(task);
            }
        }
        Ok(())
    }

    async fn create_task(&self, task: &NewTask) -> Result<CreatedTask, RemoteError> {
        let mut state = self.begin("create_task", task.title.clone()).await?;
        let id = state.allocate();
        let board = state.board_with_column(task.column_id)?;
        if let Some(column) = board.columns.iter_mut().find(|c| c.id == Some(task.column_id)) {
            column.tasks.push(TaskRecord {
                id,
                title: task.title.clone(),
                description: task.description.clone(),
                position: task.order,
            });
        }
        Ok(CreatedTask { id })
    }

    async fn delete_task(&self, task_id: Identifier) -> Result<(), RemoteError> {
        let mut state = self.begin("delete_task", task_id.to_string()).await?;
        state
            .boards
            .values_mut()
            .find_map(|board| take_task(board, task_id))
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(format!("task {}", task_id)))
    }

    async fn delete_user(&self, username: &str) -> Result<(), RemoteError> {
        let mut state = self.begin("delete_user", username.to_string()).await?;
        let mut found = false;
        for board in state.boards.values_mut() {
            let before = board.members.len();
            board.members.retain(|member| member.username != username);
            found |= board.members.len() != before;
        }
        if found {
            Ok(())
        } else {
            Err(RemoteError::NotFound(format!("user {}", username)))
        }
    }

    async fn verify_token(&self, username: &str, token: &str) -> Result<TokenStatus, RemoteError> {
        let state = self.begin("verify_token", username.to_string()).await?;
        let valid = state.tokens.get(username).is_some_and(|expected| expected == token);
        Ok(TokenStatus { valid })
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.messages().into_iter().map(|(title, _)| title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}
