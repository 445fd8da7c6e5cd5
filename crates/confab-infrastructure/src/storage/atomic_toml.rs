//! Atomic TOML file storage.
//!
//! Backs the configuration file. The JSON twin in
//! [`atomic_json`](super::atomic_json) backs session state and history.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`AtomicTomlFile`].
#[derive(Debug, Error)]
pub enum AtomicTomlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Typed TOML storage with atomic replacement.
///
/// `save` never leaves a half-written target behind: data is rendered to
/// a hidden staging file, fsynced, and renamed over the target in one
/// step.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
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
    /// are an error.
    pub fn load(&self) -> Result<Option<T>, AtomicTomlError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(toml::from_str(&content)?))
    }

    /// Serializes `data` and replaces the file contents atomically,
    /// creating parent directories as needed.
    pub fn save(&self, data: &T) -> Result<(), AtomicTomlError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(data)?;

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

    fn staging_path(&self) -> Result<PathBuf, AtomicTomlError> {
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
