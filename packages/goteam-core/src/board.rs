/// Pure transformations of the board tree.
///
/// Every mutating operation takes `&self` and returns a new `Board`, leaving
/// the receiver untouched. Optimistic updates rely on this: rolling back is
/// just publishing the value captured before the change.
///
/// Ordering rules:
/// - A board always has exactly one column per `ColumnOrder`, ascending.
/// - Within a column, `tasks[i].position == i`. Inserting or removing a task
///   shifts the tasks after it; moving is remove + insert (shift, not swap).
/// - `Task::column_id` always mirrors the id of the column holding the task.
use std::collections::HashSet;

use crate::remote::{BoardRecord, TaskPosition};
use crate::types::{Board, Column, ColumnOrder, Identifier, Task};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Column not found: {0}")]
    ColumnNotFound(ColumnOrder),

    #[error("Task not found: {0}")]
    TaskNotFound(Identifier),

    #[error("Task {0} is already on the board")]
    DuplicateTask(Identifier),

    #[error("Column {0} has not been saved yet")]
    UnsavedColumn(ColumnOrder),

    #[error("Index {index} out of range (0-{max})")]
    InvalidIndex { index: usize, max: usize },

    #[error("Invalid board: {0}")]
    InvalidBoard(String),
}

impl BoardError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BoardError::ColumnNotFound(_) | BoardError::TaskNotFound(_) | BoardError::UnsavedColumn(_)
        )
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl Board {
    /// The board held before anything has been created or loaded: no id, four
    /// unsaved empty columns.
    pub fn empty() -> Self {
        Self {
            id: None,
            name: String::new(),
            columns: ColumnOrder::ALL
                .iter()
                .map(|&order| Column {
                    id: None,
                    order,
                    tasks: Vec::new(),
                })
                .collect(),
        }
    }

    /// A freshly created board as acknowledged by the remote.
    pub fn created(id: Identifier, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            ..Board::empty()
        }
    }

    pub fn find_column(&self, order: ColumnOrder) -> Result<&Column, BoardError> {
        self.columns
            .get(order.rank())
            .filter(|column| column.order == order)
            .ok_or(BoardError::ColumnNotFound(order))
    }

    fn column_mut(&mut self, order: ColumnOrder) -> Result<&mut Column, BoardError> {
        self.columns
            .get_mut(order.rank())
            .filter(|column| column.order == order)
            .ok_or(BoardError::ColumnNotFound(order))
    }

    /// Column and index currently holding a task.
    pub fn locate_task(&self, task_id: Identifier) -> Result<(ColumnOrder, usize), BoardError> {
        self.columns
            .iter()
            .find_map(|column| {
                column
                    .tasks
                    .iter()
                    .position(|task| task.id == task_id)
                    .map(|index| (column.order, index))
            })
            .ok_or(BoardError::TaskNotFound(task_id))
    }

    pub fn find_task(&self, task_id: Identifier) -> Result<&Task, BoardError> {
        let (order, index) = self.locate_task(task_id)?;
        Ok(&self.find_column(order)?.tasks[index])
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|column| column.tasks.len()).sum()
    }

    /// Target index for `move_task` when `moving` is dropped onto `target`
    /// just before the task `before` (or at the end when `None`).
    ///
    /// The index is counted with `moving` already taken out of its column.
    pub fn drop_index(
        &self,
        moving: Identifier,
        target: ColumnOrder,
        before: Option<Identifier>,
    ) -> Result<usize, BoardError> {
        self.locate_task(moving)?;
        let remaining: Vec<Identifier> = self
            .find_column(target)?
            .tasks
            .iter()
            .map(|task| task.id)
            .filter(|&id| id != moving)
            .collect();

        match before {
            None => Ok(remaining.len()),
            Some(id) if id == moving => {
                let (order, index) = self.locate_task(moving)?;
                if order == target {
                    Ok(index)
                } else {
                    Err(BoardError::TaskNotFound(id))
                }
            }
            Some(id) => remaining
                .iter()
                .position(|&candidate| candidate == id)
                .ok_or(BoardError::TaskNotFound(id)),
        }
    }

    /// Insert `task` at `index` in the column, shifting later tasks down by one.
    pub fn insert_task(&self, task: Task, order: ColumnOrder, index: usize) -> Result<Board, BoardError> {
        if self.locate_task(task.id).is_ok() {
            return Err(BoardError::DuplicateTask(task.id));
        }
        let mut next = self.clone();
        let column = next.column_mut(order)?;
        if index > column.tasks.len() {
            return Err(BoardError::InvalidIndex {
                index,
                max: column.tasks.len(),
            });
        }
        column.tasks.insert(index, task);
        renumber(column);
        Ok(next)
    }

    /// Remove a task, shifting the tasks after it up by one.
    pub fn remove_task(&self, task_id: Identifier) -> Result<Board, BoardError> {
        self.take_task(task_id).map(|(board, _)| board)
    }

    fn take_task(&self, task_id: Identifier) -> Result<(Board, Task), BoardError> {
        let (order, index) = self.locate_task(task_id)?;
        let mut next = self.clone();
        let column = next.column_mut(order)?;
        let task = column.tasks.remove(index);
        renumber(column);
        Ok((next, task))
    }

    /// Move a task to `index` of `target` (possibly its own column). Backs
    /// drag-and-drop; applying the same move twice equals applying it once.
    pub fn move_task(
        &self,
        task_id: Identifier,
        target: ColumnOrder,
        index: usize,
    ) -> Result<Board, BoardError> {
        let (without, task) = self.take_task(task_id)?;
        without.insert_task(task, target, index)
    }

    /// `{id, order}` list describing a column, as the remote records it.
    pub fn column_positions(&self, order: ColumnOrder) -> Result<(Identifier, Vec<TaskPosition>), BoardError> {
        let column = self.find_column(order)?;
        let column_id = column.id.ok_or(BoardError::UnsavedColumn(order))?;
        let positions = column
            .tasks
            .iter()
            .map(|task| TaskPosition {
                id: task.id,
                order: task.position,
            })
            .collect();
        Ok((column_id, positions))
    }

    /// Check every structural invariant of the tree.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.columns.len() != ColumnOrder::ALL.len() {
            return Err(BoardError::InvalidBoard(format!(
                "expected {} columns, found {}",
                ColumnOrder::ALL.len(),
                self.columns.len()
            )));
        }
        let mut seen = HashSet::new();
        for (column, expected) in self.columns.iter().zip(ColumnOrder::ALL) {
            if column.order != expected {
                return Err(BoardError::InvalidBoard(format!(
                    "column {} found where {} belongs",
                    column.order, expected
                )));
            }
            for (index, task) in column.tasks.iter().enumerate() {
                if task.position != index {
                    return Err(BoardError::InvalidBoard(format!(
                        "task {} in {} has position {} at index {}",
                        task.id, column.order, task.position, index
                    )));
                }
                if task.column_id != column.id {
                    return Err(BoardError::InvalidBoard(format!(
                        "task {} does not reference column {}",
                        task.id, column.order
                    )));
                }
                if !seen.insert(task.id) {
                    return Err(BoardError::DuplicateTask(task.id));
                }
            }
        }
        Ok(())
    }
}

fn renumber(column: &mut Column) {
    let column_id = column.id;
    for (index, task) in column.tasks.iter_mut().enumerate() {
        task.position = index;
        task.column_id = column_id;
    }
}

impl TryFrom<BoardRecord> for Board {
    type Error = BoardError;

    /// Build a board from a fetched record. Columns may arrive in any order but
    /// there must be exactly one per `ColumnOrder`. Tasks are sorted by
    /// position and renumbered from zero; two tasks sharing a position are
    /// rejected.
    fn try_from(record: BoardRecord) -> Result<Self, Self::Error> {
        let mut records = record.columns;
        records.sort_by_key(|column| column.order);
        if records.len() != ColumnOrder::ALL.len() {
            return Err(BoardError::InvalidBoard(format!(
                "board {} has {} columns",
                record.id,
                records.len()
            )));
        }

        let mut columns = Vec::with_capacity(records.len());
        for (column_record, expected) in records.into_iter().zip(ColumnOrder::ALL) {
            if column_record.order != expected {
                return Err(BoardError::InvalidBoard(format!(
                    "board {} is missing column {}",
                    record.id, expected
                )));
            }
            let mut task_records = column_record.tasks;
            task_records.sort_by_key(|task| task.position);
            if let Some(pair) = task_records.windows(2).find(|pair| pair[0].position == pair[1].position) {
                return Err(BoardError::InvalidBoard(format!(
                    "tasks {} and {} share position {} in {}",
                    pair[0].id, pair[1].id, pair[0].position, expected
                )));
            }
            let mut column = Column {
                id: column_record.id,
                order: expected,
                tasks: task_records
                    .into_iter()
                    .map(|task| Task {
                        id: task.id,
                        title: task.title,
                        description: task.description,
                        column_id: None,
                        position: task.position,
                    })
                    .collect(),
            };
            renumber(&mut column);
            columns.push(column);
        }

        let board = Board {
            id: Some(record.id),
            name: record.name,
            columns,
        };
        board.validate()?;
        Ok(board)
    }
}
