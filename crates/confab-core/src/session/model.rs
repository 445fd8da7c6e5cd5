//! Chat session domain model.
//!
//! This module contains the core ChatSession entity that represents
//! one independent conversation in the application's domain layer.

use crate::config::ChatDefaults;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents one chat session in the application's domain layer.
///
/// A session carries:
/// - A unique opaque identifier
/// - A human-readable title (derived from the first prompt once one is sent)
/// - An optional working directory the agent operates in
/// - The selected model and mode ids
///
/// The session list itself, along with all per-session derived state
/// (messages, draft, generating flag, notice, terminal binding, option
/// overrides), is owned by [`SessionRegistry`](super::SessionRegistry);
/// every other component references a session by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Working directory for the agent, if one was chosen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Selected model id
    pub model: String,
    /// Selected mode id
    pub mode: String,
}

impl ChatSession {
    /// Default title for sessions created without an explicit one.
    pub const DEFAULT_TITLE: &'static str = "New Chat";

    /// Creates a session with a fresh id and the given defaults.
    pub fn new(title: impl Into<String>, cwd: Option<String>, defaults: &ChatDefaults) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            cwd,
            model: defaults.model_id.clone(),
            mode: defaults.mode_id.clone(),
        }
    }

    /// Applies a partial update, leaving unset fields untouched.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(cwd) = patch.cwd {
            self.cwd = cwd;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
    }
}

/// A partial update for [`ChatSession`].
///
/// `None` leaves the field untouched. The `cwd` field is doubly optional so
/// an update can also clear the working directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub cwd: Option<Option<String>>,
    pub model: Option<String>,
    pub mode: Option<String>,
}

impl SessionPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn mode(mode: impl Into<String>) -> Self {
        Self {
            mode: Some(mode.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_uses_defaults() {
        let defaults = ChatDefaults::default();
        let session = ChatSession::new("Hello", Some("/tmp".to_string()), &defaults);

        assert!(!session.id.is_empty());
        assert_eq!(session.title, "Hello");
        assert_eq!(session.cwd.as_deref(), Some("/tmp"));
        assert_eq!(session.model, defaults.model_id);
        assert_eq!(session.mode, defaults.mode_id);
    }

    #[test]
    fn test_apply_patch_merges_fields() {
        let defaults = ChatDefaults::default();
        let mut session = ChatSession::new("Old", None, &defaults);
        let original_mode = session.mode.clone();

        session.apply(SessionPatch {
            title: Some("Updated".to_string()),
            model: Some("other-model".to_string()),
            ..SessionPatch::default()
        });

        assert_eq!(session.title, "Updated");
        assert_eq!(session.model, "other-model");
        assert_eq!(session.mode, original_mode);
    }

    #[test]
    fn test_patch_can_clear_cwd() {
        let defaults = ChatDefaults::default();
        let mut session = ChatSession::new("S", Some("/work".to_string()), &defaults);

        session.apply(SessionPatch {
            cwd: Some(None),
            ..SessionPatch::default()
        });

        assert_eq!(session.cwd, None);
    }
}
