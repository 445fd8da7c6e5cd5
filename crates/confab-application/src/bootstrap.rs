//! Application assembly.
//!
//! Wires the registry, queues, history, file storage, and the orchestrator
//! into one ready-to-use bundle. An embedding shell calls [`bootstrap`] once
//! at startup, passing its backend transport and terminal control, and hands
//! out clones of the shared services to whatever surface it drives.

use crate::chat_usecase::ChatUseCase;
use crate::persistence_service::PersistenceService;
use anyhow::{Result, anyhow};
use confab_core::backend::{AgentBackend, TerminalControl};
use confab_core::history::{PromptHistory, PromptHistoryRepository};
use confab_core::queue::MessageQueues;
use confab_core::session::{SessionRegistry, SessionSnapshotRepository};
use confab_infrastructure::paths::ConfabPaths;
use confab_infrastructure::{ConfigService, JsonHistoryRepository, JsonSnapshotRepository};
use std::sync::Arc;

/// Shared services assembled at startup.
pub struct ChatApp {
    pub registry: Arc<SessionRegistry>,
    pub queues: Arc<MessageQueues>,
    pub history: Arc<PromptHistory>,
    pub usecase: Arc<ChatUseCase>,
    pub persistence: Arc<PersistenceService>,
    pub config_service: Arc<ConfigService>,
}

/// Assembles the application against the platform config directory and
/// restores persisted state.
///
/// # Arguments
///
/// * `backend` - Transport to the agent process
/// * `terminals` - Terminal lifecycle hooks for session cleanup
pub async fn bootstrap(
    backend: Arc<dyn AgentBackend>,
    terminals: Arc<dyn TerminalControl>,
) -> Result<ChatApp> {
    let config_service = Arc::new(ConfigService::new());

    let state_path = ConfabPaths::state_file()
        .map_err(|e| anyhow!("Failed to resolve state path: {}", e))?;
    let history_path = ConfabPaths::history_file()
        .map_err(|e| anyhow!("Failed to resolve history path: {}", e))?;

    let snapshot_repository: Arc<dyn SessionSnapshotRepository> = Arc::new(
        JsonSnapshotRepository::new(state_path, config_service.chat_defaults()),
    );
    let history_repository: Arc<dyn PromptHistoryRepository> =
        Arc::new(JsonHistoryRepository::new(history_path));

    Ok(bootstrap_with(
        config_service,
        snapshot_repository,
        history_repository,
        backend,
        terminals,
    )
    .await)
}

/// Assembles the application against explicit storage.
///
/// Used by [`bootstrap`] and by embedders that want to substitute storage
/// locations or implementations.
pub async fn bootstrap_with(
    config_service: Arc<ConfigService>,
    snapshot_repository: Arc<dyn SessionSnapshotRepository>,
    history_repository: Arc<dyn PromptHistoryRepository>,
    backend: Arc<dyn AgentBackend>,
    terminals: Arc<dyn TerminalControl>,
) -> ChatApp {
    // Composition root: every service below is shared via Arc
    let registry = Arc::new(SessionRegistry::new(config_service.chat_defaults()));
    let queues = Arc::new(MessageQueues::new());
    let history = Arc::new(PromptHistory::new());

    let usecase = Arc::new(ChatUseCase::new(
        registry.clone(),
        queues.clone(),
        history.clone(),
        backend,
        terminals,
    ));
    let persistence = Arc::new(PersistenceService::new(
        registry.clone(),
        history.clone(),
        snapshot_repository,
        history_repository,
    ));

    let fresh_session_id = persistence.restore().await;
    tracing::info!("[Bootstrap] Ready, fresh session: {}", fresh_session_id);

    ChatApp {
        registry,
        queues,
        history,
        usecase,
        persistence,
        config_service,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use confab_core::Result;
    use confab_core::backend::BackendSession;
    use confab_core::session::{ChatSession, RegistrySnapshot};
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct NoopBackend;

    #[async_trait]
    impl AgentBackend for NoopBackend {
        async fn create_session(&self, _cwd: &str) -> Result<BackendSession> {
            Ok(BackendSession {
                session_id: "agent-1".to_string(),
                model_options: vec![],
                current_model_id: None,
                mode_options: vec![],
                current_mode_id: None,
            })
        }

        async fn send_prompt(&self, _backend_session_id: &str, _content: &str) -> Result<()> {
            Ok(())
        }

        async fn set_model(&self, _backend_session_id: &str, _model_id: &str) -> Result<()> {
            Ok(())
        }

        async fn set_mode(&self, _backend_session_id: &str, _mode_id: &str) -> Result<()> {
            Ok(())
        }
    }

    struct NoopTerminals;

    #[async_trait]
    impl TerminalControl for NoopTerminals {
        async fn kill(&self, _terminal_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn temp_app_parts(
        temp_dir: &TempDir,
    ) -> (
        Arc<ConfigService>,
        Arc<dyn SessionSnapshotRepository>,
        Arc<dyn PromptHistoryRepository>,
    ) {
        let config_service = Arc::new(ConfigService::with_path(
            temp_dir.path().join("config.toml"),
        ));
        let snapshot_repository: Arc<dyn SessionSnapshotRepository> =
            Arc::new(JsonSnapshotRepository::new(
                temp_dir.path().join("state.json"),
                config_service.chat_defaults(),
            ));
        let history_repository: Arc<dyn PromptHistoryRepository> =
            Arc::new(JsonHistoryRepository::new(
                temp_dir.path().join("history.json"),
            ));
        (config_service, snapshot_repository, history_repository)
    }

    #[tokio::test]
    async fn test_bootstrap_on_empty_storage_opens_one_fresh_session() {
        let temp_dir = TempDir::new().unwrap();
        let (config_service, snapshots, history_repo) = temp_app_parts(&temp_dir);

        let app = bootstrap_with(
            config_service,
            snapshots,
            history_repo,
            Arc::new(NoopBackend),
            Arc::new(NoopTerminals),
        )
        .await;

        let sessions = app.registry.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(
            app.registry.selected_session_id().await,
            Some(sessions[0].id.clone())
        );
    }

    #[tokio::test]
    async fn test_bootstrap_restores_persisted_sessions_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let defaults = confab_core::config::ChatDefaults::default();

        // Seed the state file the way a previous run would have left it
        let previous = ChatSession::new("Yesterday's work", Some("/work".to_string()), &defaults);
        let previous_id = previous.id.clone();
        let seeded = JsonSnapshotRepository::new(temp_dir.path().join("state.json"), defaults);
        seeded
            .save(&RegistrySnapshot {
                selected_session_id: Some(previous_id.clone()),
                sessions: vec![previous],
                messages: HashMap::new(),
                drafts: HashMap::new(),
            })
            .await
            .unwrap();

        let (config_service, snapshots, history_repo) = temp_app_parts(&temp_dir);
        let app = bootstrap_with(
            config_service,
            snapshots,
            history_repo,
            Arc::new(NoopBackend),
            Arc::new(NoopTerminals),
        )
        .await;

        let sessions = app.registry.sessions().await;
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().any(|s| s.id == previous_id));
        // The fresh session opened after restore is the selected one
        let selected = app.registry.selected_session_id().await;
        assert!(selected.is_some());
        assert_ne!(selected.as_deref(), Some(previous_id.as_str()));
    }

    #[tokio::test]
    async fn test_bootstrap_wires_send_through_to_saved_state() {
        let temp_dir = TempDir::new().unwrap();
        let (config_service, snapshots, history_repo) = temp_app_parts(&temp_dir);

        let app = bootstrap_with(
            config_service,
            snapshots,
            history_repo,
            Arc::new(NoopBackend),
            Arc::new(NoopTerminals),
        )
        .await;

        app.usecase.send_message("first prompt").await;
        app.persistence.save_registry().await;
        app.persistence.save_history().await;

        // A second assembly over the same directory sees the sent message
        let (config_service, snapshots, history_repo) = temp_app_parts(&temp_dir);
        let reopened = bootstrap_with(
            config_service,
            snapshots,
            history_repo,
            Arc::new(NoopBackend),
            Arc::new(NoopTerminals),
        )
        .await;

        let sessions = reopened.registry.sessions().await;
        let with_message = sessions
            .iter()
            .find(|s| s.title.starts_with("first prompt"))
            .expect("titled session should have been persisted");
        let messages = reopened.registry.messages(&with_message.id).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "first prompt");

        let recalled = reopened.usecase.previous_prompt("").await;
        assert_eq!(recalled.as_deref(), Some("first prompt"));
    }
}
