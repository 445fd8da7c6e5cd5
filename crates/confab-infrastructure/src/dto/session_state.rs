//! Persisted session state and its mapping to the domain snapshot.
//!
//! The on-disk shape tolerates hand-edited or partially damaged files:
//! almost every field falls back to a default while parsing, and the
//! mapping below repairs or drops entries instead of failing the load.

use chrono::{DateTime, Utc};
use confab_core::config::ChatDefaults;
use confab_core::session::{
    ChatSession, Message, PlanStep, RegistrySnapshot, Role, ThinkingData,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version tag written by the current build.
///
/// Payloads with any other version are treated as no data rather than
/// migrated.
pub const STATE_VERSION: u32 = 1;

/// Phase tag stored for reasoning traces, which are always finished by the
/// time they reach disk.
const THINKING_DONE: &str = "done";

// ============================================================================
// On-disk schema
// ============================================================================

/// Top-level structure of the state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    #[serde(default)]
    pub sessions: Vec<PersistedSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_session_id: Option<String>,
    #[serde(default)]
    pub messages_by_session: HashMap<String, Vec<PersistedMessage>>,
    #[serde(default)]
    pub drafts_by_session: HashMap<String, String>,
}

/// One persisted session row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// One persisted message row.
///
/// Timestamps are RFC 3339 strings; unparseable ones read back as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_steps: Option<Vec<PlanStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<PersistedThinking>,
}

/// Reasoning trace attached to a persisted message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedThinking {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

// ============================================================================
// Domain mapping
// ============================================================================

impl PersistedState {
    /// Builds the on-disk form of a registry snapshot.
    ///
    /// Messages are keyed per session (sessions without any get an empty
    /// list); drafts are written only when non-empty. Streaming flags are
    /// cleared on the way out.
    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Self {
        let sessions: Vec<PersistedSession> =
            snapshot.sessions.iter().map(persist_session).collect();

        let mut messages_by_session = HashMap::new();
        let mut drafts_by_session = HashMap::new();
        for session in &snapshot.sessions {
            let messages = snapshot
                .messages
                .get(&session.id)
                .map(|messages| messages.iter().map(persist_message).collect())
                .unwrap_or_default();
            messages_by_session.insert(session.id.clone(), messages);

            if let Some(draft) = snapshot.drafts.get(&session.id) {
                if !draft.is_empty() {
                    drafts_by_session.insert(session.id.clone(), draft.clone());
                }
            }
        }

        Self {
            version: STATE_VERSION,
            sessions,
            selected_session_id: snapshot.selected_session_id.clone(),
            messages_by_session,
            drafts_by_session,
        }
    }

    /// Maps the persisted payload into a domain snapshot.
    ///
    /// Returns `None` when the payload is unusable as a whole (version
    /// mismatch, no surviving sessions). Per-entry problems are repaired or
    /// dropped instead: sessions without an id are discarded, messages with
    /// an unknown role are discarded, missing titles and option ids take the
    /// configured defaults, and a selected id that matches no session falls
    /// back to the first one.
    pub fn into_snapshot(self, defaults: &ChatDefaults) -> Option<RegistrySnapshot> {
        if self.version != STATE_VERSION {
            return None;
        }

        let sessions: Vec<ChatSession> = self
            .sessions
            .into_iter()
            .filter_map(|session| restore_session(session, defaults))
            .collect();
        if sessions.is_empty() {
            return None;
        }

        // Rebuild the per-session maps keyed by the surviving sessions only
        let mut messages_by_session = self.messages_by_session;
        let mut drafts_by_session = self.drafts_by_session;
        let mut messages = HashMap::new();
        let mut drafts = HashMap::new();
        for session in &sessions {
            let restored: Vec<Message> = messages_by_session
                .remove(&session.id)
                .map(|stored| stored.into_iter().filter_map(restore_message).collect())
                .unwrap_or_default();
            messages.insert(session.id.clone(), restored);

            if let Some(draft) = drafts_by_session.remove(&session.id) {
                if !draft.is_empty() {
                    drafts.insert(session.id.clone(), draft);
                }
            }
        }

        let selected_session_id = self
            .selected_session_id
            .filter(|id| sessions.iter().any(|session| &session.id == id))
            .or_else(|| sessions.first().map(|session| session.id.clone()));

        Some(RegistrySnapshot {
            sessions,
            selected_session_id,
            messages,
            drafts,
        })
    }
}

fn persist_session(session: &ChatSession) -> PersistedSession {
    PersistedSession {
        id: session.id.clone(),
        title: session.title.clone(),
        cwd: session.cwd.clone(),
        model: Some(session.model.clone()),
        mode: Some(session.mode.clone()),
    }
}

fn restore_session(session: PersistedSession, defaults: &ChatDefaults) -> Option<ChatSession> {
    if session.id.trim().is_empty() {
        return None;
    }

    let title = if session.title.is_empty() {
        ChatSession::DEFAULT_TITLE.to_string()
    } else {
        session.title
    };

    Some(ChatSession {
        id: session.id,
        title,
        cwd: session.cwd,
        model: session
            .model
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| defaults.model_id.clone()),
        mode: session
            .mode
            .filter(|mode| !mode.is_empty())
            .unwrap_or_else(|| defaults.mode_id.clone()),
    })
}

fn persist_message(message: &Message) -> PersistedMessage {
    PersistedMessage {
        id: message.id.clone(),
        role: role_tag(message.role).to_string(),
        content: message.content.clone(),
        timestamp: message.timestamp.map(|ts| ts.to_rfc3339()),
        is_streaming: message.is_streaming.map(|_| false),
        plan_steps: message.plan_steps.clone(),
        thinking: message.thinking.as_ref().map(persist_thinking),
    }
}

fn restore_message(message: PersistedMessage) -> Option<Message> {
    let role = parse_role(&message.role)?;

    Some(Message {
        id: message.id,
        role,
        content: message.content,
        timestamp: message.timestamp.as_deref().and_then(parse_timestamp),
        is_streaming: message.is_streaming.map(|_| false),
        plan_steps: message.plan_steps,
        thinking: message.thinking.map(restore_thinking),
    })
}

fn persist_thinking(thinking: &ThinkingData) -> PersistedThinking {
    PersistedThinking {
        content: thinking.content.clone(),
        is_streaming: Some(false),
        phase: Some(THINKING_DONE.to_string()),
        started_at: thinking.started_at.map(|ts| ts.to_rfc3339()),
        duration_ms: thinking.duration_ms,
    }
}

fn restore_thinking(thinking: PersistedThinking) -> ThinkingData {
    ThinkingData {
        content: thinking.content,
        is_streaming: Some(false),
        phase: Some(THINKING_DONE.to_string()),
        started_at: thinking.started_at.as_deref().and_then(parse_timestamp),
        duration_ms: thinking.duration_ms,
    }
}

fn role_tag(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Thought => "thought",
    }
}

fn parse_role(tag: &str) -> Option<Role> {
    match tag {
        "user" => Some(Role::User),
        "assistant" => Some(Role::Assistant),
        "thought" => Some(Role::Thought),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_two_sessions() -> RegistrySnapshot {
        let defaults = ChatDefaults::default();
        let first = ChatSession::new("First", Some("/work".to_string()), &defaults);
        let second = ChatSession::new("Second", None, &defaults);

        let mut messages = HashMap::new();
        messages.insert(
            first.id.clone(),
            vec![Message::user("hello"), Message::assistant("hi there")],
        );
        messages.insert(second.id.clone(), vec![]);

        let mut drafts = HashMap::new();
        drafts.insert(second.id.clone(), "half-typed".to_string());

        RegistrySnapshot {
            selected_session_id: Some(second.id.clone()),
            sessions: vec![first, second],
            messages,
            drafts,
        }
    }

    #[test]
    fn test_round_trip_preserves_sessions_messages_and_drafts() {
        let snapshot = snapshot_with_two_sessions();
        let defaults = ChatDefaults::default();

        let state = PersistedState::from_snapshot(&snapshot);
        assert_eq!(state.version, STATE_VERSION);

        let restored = state.into_snapshot(&defaults).unwrap();
        assert_eq!(restored.sessions, snapshot.sessions);
        assert_eq!(restored.selected_session_id, snapshot.selected_session_id);
        assert_eq!(restored.drafts, snapshot.drafts);

        let first_id = &snapshot.sessions[0].id;
        assert_eq!(restored.messages[first_id].len(), 2);
        assert_eq!(restored.messages[first_id][0].content, "hello");
        assert_eq!(restored.messages[first_id][1].content, "hi there");
    }

    #[test]
    fn test_version_mismatch_reads_as_no_data() {
        let mut state = PersistedState::from_snapshot(&snapshot_with_two_sessions());
        state.version = 99;

        assert!(state.into_snapshot(&ChatDefaults::default()).is_none());
    }

    #[test]
    fn test_sessions_without_id_are_dropped() {
        let defaults = ChatDefaults::default();
        let state = PersistedState {
            version: STATE_VERSION,
            sessions: vec![
                PersistedSession {
                    id: "  ".to_string(),
                    title: "Ghost".to_string(),
                    ..Default::default()
                },
                PersistedSession {
                    id: "real".to_string(),
                    title: "Real".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let restored = state.into_snapshot(&defaults).unwrap();
        assert_eq!(restored.sessions.len(), 1);
        assert_eq!(restored.sessions[0].id, "real");
    }

    #[test]
    fn test_no_surviving_sessions_reads_as_no_data() {
        let state = PersistedState {
            version: STATE_VERSION,
            sessions: vec![PersistedSession::default()],
            ..Default::default()
        };

        assert!(state.into_snapshot(&ChatDefaults::default()).is_none());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let defaults = ChatDefaults::default();
        let state = PersistedState {
            version: STATE_VERSION,
            sessions: vec![PersistedSession {
                id: "s1".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let restored = state.into_snapshot(&defaults).unwrap();
        let session = &restored.sessions[0];
        assert_eq!(session.title, ChatSession::DEFAULT_TITLE);
        assert_eq!(session.model, defaults.model_id);
        assert_eq!(session.mode, defaults.mode_id);
        assert_eq!(restored.selected_session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_unknown_selected_id_falls_back_to_first_session() {
        let mut state = PersistedState::from_snapshot(&snapshot_with_two_sessions());
        state.selected_session_id = Some("no-such-session".to_string());

        let restored = state.into_snapshot(&ChatDefaults::default()).unwrap();
        let first_id = restored.sessions[0].id.clone();
        assert_eq!(restored.selected_session_id, Some(first_id));
    }

    #[test]
    fn test_streaming_flags_are_cleared_in_both_directions() {
        let defaults = ChatDefaults::default();
        let session = ChatSession::new("Live", None, &defaults);

        let mut streaming = Message::assistant("partial answer");
        streaming.is_streaming = Some(true);
        streaming.thinking = Some(ThinkingData {
            content: "working through it".to_string(),
            is_streaming: Some(true),
            phase: Some("streaming".to_string()),
            started_at: Some(Utc::now()),
            duration_ms: None,
        });

        let mut messages = HashMap::new();
        messages.insert(session.id.clone(), vec![streaming]);
        let snapshot = RegistrySnapshot {
            selected_session_id: Some(session.id.clone()),
            sessions: vec![session.clone()],
            messages,
            drafts: HashMap::new(),
        };

        let state = PersistedState::from_snapshot(&snapshot);
        let stored = &state.messages_by_session[&session.id][0];
        assert_eq!(stored.is_streaming, Some(false));
        let stored_thinking = stored.thinking.as_ref().unwrap();
        assert_eq!(stored_thinking.is_streaming, Some(false));
        assert_eq!(stored_thinking.phase.as_deref(), Some("done"));

        let restored = state.into_snapshot(&defaults).unwrap();
        let message = &restored.messages[&session.id][0];
        assert_eq!(message.is_streaming, Some(false));
        assert_eq!(
            message.thinking.as_ref().unwrap().phase.as_deref(),
            Some("done")
        );
    }

    #[test]
    fn test_unknown_roles_and_bad_timestamps_are_tolerated() {
        let defaults = ChatDefaults::default();
        let mut messages_by_session = HashMap::new();
        messages_by_session.insert(
            "s1".to_string(),
            vec![
                PersistedMessage {
                    id: "m1".to_string(),
                    role: "user".to_string(),
                    content: "kept".to_string(),
                    timestamp: Some("not a timestamp".to_string()),
                    ..Default::default()
                },
                PersistedMessage {
                    id: "m2".to_string(),
                    role: "narrator".to_string(),
                    content: "dropped".to_string(),
                    ..Default::default()
                },
            ],
        );

        let state = PersistedState {
            version: STATE_VERSION,
            sessions: vec![PersistedSession {
                id: "s1".to_string(),
                title: "Chat".to_string(),
                ..Default::default()
            }],
            messages_by_session,
            ..Default::default()
        };

        let restored = state.into_snapshot(&defaults).unwrap();
        let messages = &restored.messages["s1"];
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "kept");
        assert!(messages[0].timestamp.is_none());
    }

    #[test]
    fn test_orphaned_map_entries_are_discarded() {
        let defaults = ChatDefaults::default();
        let mut state = PersistedState::from_snapshot(&snapshot_with_two_sessions());
        state.messages_by_session.insert(
            "deleted-session".to_string(),
            vec![PersistedMessage {
                id: "m".to_string(),
                role: "user".to_string(),
                content: "stale".to_string(),
                ..Default::default()
            }],
        );
        state
            .drafts_by_session
            .insert("deleted-session".to_string(), "stale draft".to_string());

        let restored = state.into_snapshot(&defaults).unwrap();
        assert!(!restored.messages.contains_key("deleted-session"));
        assert!(!restored.drafts.contains_key("deleted-session"));
    }

    #[test]
    fn test_raw_payload_with_missing_maps_parses() {
        let raw = r#"
        {
            "version": 1,
            "sessions": [{ "id": "s1", "title": "Solo" }]
        }
        "#;

        let state: PersistedState = serde_json::from_str(raw).unwrap();
        let restored = state.into_snapshot(&ChatDefaults::default()).unwrap();
        assert_eq!(restored.sessions.len(), 1);
        assert!(restored.messages["s1"].is_empty());
    }
}
