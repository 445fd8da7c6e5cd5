//! JSON file persistence for prompt history.

use crate::storage::{AtomicJsonError, AtomicJsonFile};
use async_trait::async_trait;
use confab_core::Result;
use confab_core::history::PromptHistoryRepository;
use serde_json::Value;
use std::path::PathBuf;

/// Stores prompt history as a flat JSON array of strings.
///
/// Loading drops entries that are not strings and treats an unparseable
/// file as empty history.
pub struct JsonHistoryRepository {
    file: AtomicJsonFile<Vec<Value>>,
}

impl JsonHistoryRepository {
    /// Creates a repository backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }
}

#[async_trait]
impl PromptHistoryRepository for JsonHistoryRepository {
    async fn load(&self) -> Result<Vec<String>> {
        match self.file.load() {
            Ok(Some(values)) => Ok(values
                .into_iter()
                .filter_map(|value| match value {
                    Value::String(entry) => Some(entry),
                    _ => None,
                })
                .collect()),
            Ok(None) => Ok(Vec::new()),
            Err(AtomicJsonError::Json(e)) => {
                tracing::warn!(
                    "[JsonHistoryRepository] Ignoring unreadable history file: {}",
                    e
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &[String]) -> Result<()> {
        let values: Vec<Value> = entries.iter().cloned().map(Value::String).collect();
        self.file.save(&values)?;
        Ok(())
    }
}
