//! Runtime for executing sessions
//!
//! One `SessionState` per user, each behind its own async mutex so a user's
//! messages are handled strictly in order while different users proceed in
//! parallel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::backend::{HttpBackend, LoggingBackend};
use crate::state_machine::SessionState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = SessionRuntime<LoggingBackend<HttpBackend>>;

/// Shared handle to one user's session
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Owns every user's session state
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<i64, SessionHandle>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the session for a user
    pub async fn get_or_create(&self, user_id: i64) -> SessionHandle {
        // Check if already present
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(&user_id) {
                return handle.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id)
            .or_insert_with(|| {
                tracing::debug!(user_id, "Created session");
                Arc::new(Mutex::new(SessionState::default()))
            })
            .clone()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
