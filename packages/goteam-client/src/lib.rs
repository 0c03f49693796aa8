//! goteam client: configuration, HTTP transport and notifier wiring around
//! the board context from `goteam-core`.
pub mod config;
pub mod http;
pub mod notifier;

use std::sync::Arc;

use goteam_core::context::BoardContext;
use goteam_core::remote::RemoteError;
use goteam_core::session::SessionStore;

use crate::config::ClientConfig;
use crate::http::HttpRemote;
use crate::notifier::LogNotifier;

/// Build a board context talking HTTP to the configured backend and logging
/// notifications.
pub fn connect(config: &ClientConfig, session: Arc<SessionStore>) -> Result<BoardContext, RemoteError> {
    let remote = HttpRemote::new(config, session.clone())?;
    log::info!("[goteam.client] Using backend {}", config.backend_url);
    Ok(BoardContext::new(Arc::new(remote), Arc::new(LogNotifier), session))
}
