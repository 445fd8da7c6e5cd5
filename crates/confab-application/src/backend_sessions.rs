//! Chat-session to agent-session mapping.
//!
//! Each chat session talks to exactly one agent-side session, created
//! lazily on first send. Concurrent creations for the same chat session
//! are deduplicated through a per-session `tokio::sync::OnceCell`.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

/// Maps chat session ids to their agent-side session ids.
///
/// `cells` carries one `OnceCell` per chat session so callers racing to
/// create the same agent session run the creation once and share its
/// outcome; a failed creation leaves the cell empty and the next caller
/// retries. `established` holds ids that are already usable and is written
/// as soon as the agent reports the new session, before the option warm-up
/// runs, so lookups during warm-up already resolve.
#[derive(Default)]
pub struct BackendSessions {
    cells: RwLock<HashMap<String, Arc<OnceCell<String>>>>,
    established: RwLock<HashMap<String, String>>,
}

impl BackendSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the creation cell for a chat session, inserting an empty one
    /// on first use.
    pub async fn cell(&self, chat_session_id: &str) -> Arc<OnceCell<String>> {
        let mut cells = self.cells.write().await;
        cells
            .entry(chat_session_id.to_string())
            .or_default()
            .clone()
    }

    /// Records an established mapping.
    pub async fn record(&self, chat_session_id: &str, backend_session_id: &str) {
        let mut established = self.established.write().await;
        established.insert(
            chat_session_id.to_string(),
            backend_session_id.to_string(),
        );
    }

    /// Looks up an established mapping without creating anything.
    pub async fn lookup(&self, chat_session_id: &str) -> Option<String> {
        let established = self.established.read().await;
        established.get(chat_session_id).cloned()
    }

    /// Drops all state for a chat session.
    pub async fn forget(&self, chat_session_id: &str) {
        self.cells.write().await.remove(chat_session_id);
        self.established.write().await.remove(chat_session_id);
    }
}
