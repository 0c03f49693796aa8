/// Session credentials for the signed-in user.
///
/// Held in memory only and dropped on logout; the board state never owns it.
/// Shared between the board context and the transport, which reads it to
/// authenticate each request.
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub auth_token: String,
}

impl Session {
    pub fn new(username: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth_token: auth_token.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            current: RwLock::new(Some(session)),
        }
    }

    pub fn get(&self) -> Option<Session> {
        self.current
            .read()
            .map(|current| current.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn store(&self, session: Session) {
        log::info!("[goteam.session] Signed in as {}", session.username);
        *self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
    }

    pub fn clear(&self) {
        let previous = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(session) = previous {
            log::info!("[goteam.session] Cleared session for {}", session.username);
        }
    }
}
