//! File locations for configuration and persisted chat state.
//!
//! Everything lives under one application directory inside the platform
//! config root (resolved via the `dirs` crate), so the layout is the same
//! on Linux, macOS, and Windows.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to resolve a well-known location.
#[derive(Debug, Error)]
pub enum PathError {
    /// The platform config root could not be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

/// Well-known file locations for confab.
///
/// On Linux the layout is:
///
/// ```text
/// ~/.config/confab/
/// ├── config.toml     chat defaults
/// ├── state.json      sessions, messages, drafts
/// └── history.json    prompt history
/// ```
pub struct ConfabPaths;

impl ConfabPaths {
    /// The application directory inside the platform config root.
    ///
    /// Fails with [`PathError::HomeDirNotFound`] when the platform
    /// reports no config root at all.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("confab"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Location of the configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Location of the persisted session state file.
    pub fn state_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("state.json"))
    }

    /// Location of the prompt history file.
    pub fn history_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("history.json"))
    }
}
