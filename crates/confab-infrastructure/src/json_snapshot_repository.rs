//! JSON file persistence for the session registry snapshot.

use crate::dto::PersistedState;
use crate::storage::{AtomicJsonError, AtomicJsonFile};
use async_trait::async_trait;
use confab_core::Result;
use confab_core::config::ChatDefaults;
use confab_core::session::{RegistrySnapshot, SessionSnapshotRepository};
use std::path::PathBuf;

/// Stores the registry snapshot as a single JSON document on disk.
///
/// Loading is forgiving: a file that cannot be parsed is reported as no
/// data so a damaged state file never blocks startup. Writes go through
/// [`AtomicJsonFile`] and are all-or-nothing.
pub struct JsonSnapshotRepository {
    file: AtomicJsonFile<PersistedState>,
    defaults: ChatDefaults,
}

impl JsonSnapshotRepository {
    /// Creates a repository backed by the given file path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the state file
    /// * `defaults` - Chat defaults used to repair incomplete session rows
    pub fn new(path: PathBuf, defaults: ChatDefaults) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
            defaults,
        }
    }
}

#[async_trait]
impl SessionSnapshotRepository for JsonSnapshotRepository {
    async fn load(&self) -> Result<Option<RegistrySnapshot>> {
        match self.file.load() {
            Ok(Some(state)) => Ok(state.into_snapshot(&self.defaults)),
            Ok(None) => Ok(None),
            Err(AtomicJsonError::Json(e)) => {
                tracing::warn!(
                    "[JsonSnapshotRepository] Ignoring unreadable state file: {}",
                    e
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        let state = PersistedState::from_snapshot(snapshot);
        self.file.save(&state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::session::{ChatSession, Message};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn sample_snapshot(defaults: &ChatDefaults) -> RegistrySnapshot {
        let session = ChatSession::new("Persisted", Some("/repo".to_string()), defaults);
        let mut messages = HashMap::new();
        messages.insert(session.id.clone(), vec![Message::user("remember me")]);

        RegistrySnapshot {
            selected_session_id: Some(session.id.clone()),
            sessions: vec![session],
            messages,
            drafts: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let defaults = ChatDefaults::default();
        let repository = JsonSnapshotRepository::new(
            temp_dir.path().join("state.json"),
            defaults.clone(),
        );

        let snapshot = sample_snapshot(&defaults);
        repository.save(&snapshot).await.unwrap();

        let loaded = repository.load().await.unwrap().unwrap();
        assert_eq!(loaded.sessions, snapshot.sessions);
        assert_eq!(loaded.selected_session_id, snapshot.selected_session_id);
        let session_id = &snapshot.sessions[0].id;
        assert_eq!(loaded.messages[session_id].len(), 1);
        assert_eq!(loaded.messages[session_id][0].content, "remember me");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_no_data() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonSnapshotRepository::new(
            temp_dir.path().join("state.json"),
            ChatDefaults::default(),
        );

        assert!(repository.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_no_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        std::fs::write(&path, "{ definitely not json").unwrap();
        let repository = JsonSnapshotRepository::new(path, ChatDefaults::default());

        assert!(repository.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_foreign_version_is_no_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{ "version": 99, "sessions": [{ "id": "s1", "title": "Old" }] }"#,
        )
        .unwrap();
        let repository = JsonSnapshotRepository::new(path, ChatDefaults::default());

        assert!(repository.load().await.unwrap().is_none());
    }
}
