pub mod board;
pub mod context;
pub mod mutation;
pub mod notify;
pub mod remote;
pub mod session;
pub mod types;

pub use board::BoardError;
pub use context::{BoardContext, BoardSnapshot, ContextError};
pub use remote::{BoardRemote, RemoteError};
