use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier for boards, columns and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(pub u64);

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Identifier(value)
    }
}

/// Fixed rank of a column. Every board holds exactly one column per value,
/// in this order.
///
/// On the wire a column order is its integer rank (0..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ColumnOrder {
    Inbox,
    Ready,
    Go,
    Done,
}

impl ColumnOrder {
    pub const ALL: [ColumnOrder; 4] = [
        ColumnOrder::Inbox,
        ColumnOrder::Ready,
        ColumnOrder::Go,
        ColumnOrder::Done,
    ];

    pub fn rank(self) -> usize {
        match self {
            ColumnOrder::Inbox => 0,
            ColumnOrder::Ready => 1,
            ColumnOrder::Go => 2,
            ColumnOrder::Done => 3,
        }
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(ColumnOrder::Inbox),
            1 => Some(ColumnOrder::Ready),
            2 => Some(ColumnOrder::Go),
            3 => Some(ColumnOrder::Done),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnOrder::Inbox => "INBOX",
            ColumnOrder::Ready => "READY",
            ColumnOrder::Go => "GO",
            ColumnOrder::Done => "DONE",
        }
    }
}

impl fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for ColumnOrder {
    type Error = String;

    fn try_from(rank: u8) -> Result<Self, Self::Error> {
        ColumnOrder::from_rank(rank).ok_or_else(|| format!("column order {} out of range (0-3)", rank))
    }
}

impl From<ColumnOrder> for u8 {
    fn from(order: ColumnOrder) -> Self {
        order.rank() as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Identifier,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Back-reference to the containing column. Mirrors that column's id, so it
    /// stays `None` while the column itself has not been persisted.
    pub column_id: Option<Identifier>,
    pub position: usize,
}

impl Task {
    pub fn new(id: Identifier, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            column_id: None,
            position: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: Option<Identifier>,
    pub order: ColumnOrder,
    pub tasks: Vec<Task>,
}

/// The board tree: board -> columns -> tasks.
///
/// Columns are private so that the four-column invariant can only be touched
/// through the transformations in [`crate::board`]. Boards are built from a
/// validated [`crate::remote::BoardRecord`], never deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: Option<Identifier>,
    pub name: String,
    pub(crate) columns: Vec<Column>,
}

impl Board {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub username: String,
}

impl Member {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// The modal or panel currently open on the board screen. At most one is
/// active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActiveWindow {
    #[default]
    None,
    CreateBoard,
    CreateTask,
    InviteMember,
    Modal,
}

impl ActiveWindow {
    /// Window that results from activating `requested` while `self` is open.
    /// Activating the open window closes it.
    pub fn toggled(self, requested: ActiveWindow) -> ActiveWindow {
        if self == requested {
            ActiveWindow::None
        } else {
            requested
        }
    }
}
