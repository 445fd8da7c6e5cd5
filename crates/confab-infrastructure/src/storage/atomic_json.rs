//! Atomic JSON file storage.
//!
//! The JSON twin of [`AtomicTomlFile`](super::AtomicTomlFile), used for
//! persisted chat state and prompt history.

use confab_core::ConfabError;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`AtomicJsonFile`].
#[derive(Debug, Error)]
pub enum AtomicJsonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AtomicJsonError> for ConfabError {
    fn from(e: AtomicJsonError) -> Self {
        match e {
            AtomicJsonError::Io(e) => ConfabError::io(e.to_string()),
            AtomicJsonError::Json(e) => ConfabError::Serialization {
                format: "JSON".to_string(),
                message: e.to_string(),
            },
        }
    }
}

/// Typed JSON storage with atomic replacement.
///
/// Same contract as [`AtomicTomlFile`](super::AtomicTomlFile): the target
/// is only ever replaced wholesale by renaming a fully written, fsynced
/// staging file over it.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Wraps the given target path. Nothing is touched until `load`/`save`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    /// Reads and parses the file.
    ///
    /// A missing or blank file loads as `Ok(None)`; unparseable contents
    /// are an error. Callers that prefer to treat damage as "no data"
    /// match on [`AtomicJsonError::Json`].
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Serializes `data` and replaces the file contents atomically,
    /// creating parent directories as needed.
    pub fn save(&self, data: &T) -> Result<(), AtomicJsonError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = serde_json::to_string_pretty(data)?;

        // The staging file sits next to the target; the rename must not
        // cross filesystems.
        let staging = self.staging_path()?;
        let mut staged = File::create(&staging)?;
        staged.write_all(rendered.as_bytes())?;
        staged.sync_all()?;
        drop(staged);

        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn staging_path(&self) -> Result<PathBuf, AtomicJsonError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", self.path.display()),
                )
            })?
            .to_string_lossy()
            .into_owned();
        Ok(self.path.with_file_name(format!(".{}.tmp", file_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ledger {
        entries: Vec<String>,
        selected: Option<String>,
    }

    fn ledger_file(dir: &TempDir) -> AtomicJsonFile<Ledger> {
        AtomicJsonFile::new(dir.path().join("ledger.json"))
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = ledger_file(&dir);
        let ledger = Ledger {
            entries: vec!["a".to_string(), "b".to_string()],
            selected: Some("a".to_string()),
        };

        file.save(&ledger).unwrap();

        assert_eq!(file.load().unwrap(), Some(ledger));
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(ledger_file(&dir).load().unwrap().is_none());
    }

    #[test]
    fn test_load_blank_is_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ledger.json"), "").unwrap();

        assert!(ledger_file(&dir).load().unwrap().is_none());
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ledger.json"), "{ not json").unwrap();

        let result = ledger_file(&dir).load();
        assert!(matches!(result, Err(AtomicJsonError::Json(_))));
    }

    #[test]
    fn test_save_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let file = ledger_file(&dir);

        file.save(&Ledger {
            entries: vec![],
            selected: None,
        })
        .unwrap();

        assert!(!dir.path().join(".ledger.json.tmp").exists());
        assert!(dir.path().join("ledger.json").exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dir").join("ledger.json");
        let file = AtomicJsonFile::<Ledger>::new(path.clone());

        file.save(&Ledger {
            entries: vec!["x".to_string()],
            selected: None,
        })
        .unwrap();

        assert!(path.exists());
    }
}
