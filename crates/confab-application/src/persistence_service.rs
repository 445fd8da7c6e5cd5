//! Persistence coordination for registry state and prompt history.
//!
//! Storage problems never surface to the caller here: loads degrade to an
//! empty state and saves log a warning, so the chat keeps working without
//! a disk.

use confab_core::history::{PromptHistory, PromptHistoryRepository};
use confab_core::session::{SessionRegistry, SessionSnapshotRepository};
use std::sync::Arc;

/// Service wiring the registry and the prompt history to their repositories.
pub struct PersistenceService {
    /// Registry holding sessions and runtime state
    registry: Arc<SessionRegistry>,
    /// Cross-session prompt history
    history: Arc<PromptHistory>,
    /// Repository for the registry snapshot
    snapshot_repository: Arc<dyn SessionSnapshotRepository>,
    /// Repository for the prompt history entries
    history_repository: Arc<dyn PromptHistoryRepository>,
}

impl PersistenceService {
    /// Creates a new `PersistenceService` instance.
    pub fn new(
        registry: Arc<SessionRegistry>,
        history: Arc<PromptHistory>,
        snapshot_repository: Arc<dyn SessionSnapshotRepository>,
        history_repository: Arc<dyn PromptHistoryRepository>,
    ) -> Self {
        Self {
            registry,
            history,
            snapshot_repository,
            history_repository,
        }
    }

    /// Restores persisted state and opens a fresh chat on top of it.
    ///
    /// Whatever happened to the stored data, the registry ends up with at
    /// least one session: the freshly created one, which is also selected.
    ///
    /// # Returns
    ///
    /// The id of the freshly created session.
    pub async fn restore(&self) -> String {
        match self.snapshot_repository.load().await {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    "[PersistenceService] Restoring {} persisted sessions",
                    snapshot.sessions.len()
                );
                self.registry.restore(snapshot).await;
            }
            Ok(None) => {
                tracing::info!("[PersistenceService] No persisted state, starting fresh");
            }
            Err(e) => {
                tracing::warn!(
                    "[PersistenceService] Failed to load persisted state: {}",
                    e
                );
            }
        }

        match self.history_repository.load().await {
            Ok(entries) => self.history.restore(entries).await,
            Err(e) => {
                tracing::warn!(
                    "[PersistenceService] Failed to load prompt history: {}",
                    e
                );
            }
        }

        self.registry.create_new_chat(None, None).await
    }

    /// Persists the current registry snapshot.
    pub async fn save_registry(&self) {
        let snapshot = self.registry.snapshot().await;
        if let Err(e) = self.snapshot_repository.save(&snapshot).await {
            tracing::warn!("[PersistenceService] Failed to save session state: {}", e);
        }
    }

    /// Persists the prompt history.
    pub async fn save_history(&self) {
        let entries = self.history.entries().await;
        if let Err(e) = self.history_repository.save(&entries).await {
            tracing::warn!("[PersistenceService] Failed to save prompt history: {}", e);
        }
    }
}
