//! Persisted registry state.

use super::message::Message;
use super::model::ChatSession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The subset of registry state that survives a restart: the session list,
/// the selection, and per-session messages and drafts.
///
/// Runtime-only state (generating flags, notices, terminal bindings, option
/// caches) is not part of the snapshot and resets on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub sessions: Vec<ChatSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_session_id: Option<String>,
    #[serde(default)]
    pub messages: HashMap<String, Vec<Message>>,
    #[serde(default)]
    pub drafts: HashMap<String, String>,
}
