//! Session registry: the single source of truth for session state.

use super::message::{Message, MessagePatch};
use super::model::{ChatSession, SessionPatch};
use super::notice::SessionNotice;
use super::options::{OptionsCache, SelectOption};
use super::snapshot::RegistrySnapshot;
use crate::config::ChatDefaults;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Everything the registry owns, behind one lock so each operation is an
/// atomic critical section.
#[derive(Debug, Default)]
struct RegistryState {
    sessions: Vec<ChatSession>,
    selected_session_id: Option<String>,
    messages: HashMap<String, Vec<Message>>,
    drafts: HashMap<String, String>,
    notices: HashMap<String, SessionNotice>,
    generating: HashMap<String, bool>,
    terminals: HashMap<String, String>,
    slash_overrides: HashMap<String, Vec<String>>,
    model_overrides: HashMap<String, Vec<SelectOption>>,
    mode_overrides: HashMap<String, Vec<SelectOption>>,
    model_cache: OptionsCache,
    mode_cache: OptionsCache,
}

impl RegistryState {
    /// Inserts a session at the head of the list and seeds its per-session
    /// maps (empty messages, empty draft, not generating).
    fn insert_session(&mut self, session: ChatSession) {
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.messages.insert(id.clone(), Vec::new());
        self.drafts.insert(id.clone(), String::new());
        self.generating.insert(id, false);
    }

    /// Drops a session and every per-session map entry keyed by its id.
    fn purge_session(&mut self, session_id: &str) {
        self.sessions.retain(|s| s.id != session_id);
        self.messages.remove(session_id);
        self.drafts.remove(session_id);
        self.notices.remove(session_id);
        self.generating.remove(session_id);
        self.terminals.remove(session_id);
        self.slash_overrides.remove(session_id);
        self.model_overrides.remove(session_id);
        self.mode_overrides.remove(session_id);
    }
}

/// The authoritative container for chat sessions and their derived state.
///
/// Holds the session list, the selection, and all per-session maps:
/// messages, drafts, notices, generating flags, terminal bindings, and
/// model/mode/slash-command option overrides over the global option
/// caches. The queue manager and prompt history keep their own state keyed
/// by session id but never touch registry fields directly; coordination
/// happens in the orchestrator.
///
/// All methods take `&self` and lock internally, so a registry shared via
/// `Arc` can be mutated from any task. Unknown ids are silent no-ops on
/// update paths, matching the rest of the core's lookup semantics.
pub struct SessionRegistry {
    state: RwLock<RegistryState>,
    defaults: ChatDefaults,
}

impl SessionRegistry {
    /// Creates an empty registry.
    ///
    /// The caller (normally startup restore) is responsible for ensuring at
    /// least one session exists before the UI attaches.
    pub fn new(defaults: ChatDefaults) -> Self {
        let state = RegistryState {
            model_cache: OptionsCache::with_current(defaults.model_id.clone()),
            mode_cache: OptionsCache::with_current(defaults.mode_id.clone()),
            ..RegistryState::default()
        };
        Self {
            state: RwLock::new(state),
            defaults,
        }
    }

    /// The defaults this registry seeds new sessions with.
    pub fn defaults(&self) -> &ChatDefaults {
        &self.defaults
    }

    // ========================================================================
    // Session list
    // ========================================================================

    /// Inserts a session at the head of the list and initializes its
    /// per-session state. Ids are assumed caller-unique.
    pub async fn add_session(&self, session: ChatSession) {
        let mut state = self.state.write().await;
        state.insert_session(session);
    }

    /// Merges the patch into the matching session. Unknown id is a no-op.
    pub async fn update_session(&self, session_id: &str, patch: SessionPatch) {
        let mut state = self.state.write().await;
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
            session.apply(patch);
        }
    }

    /// Deletes the session and purges all of its per-session state.
    ///
    /// List invariants (such as never leaving the registry empty) are the
    /// caller's responsibility.
    pub async fn remove_session(&self, session_id: &str) {
        let mut state = self.state.write().await;
        state.purge_session(session_id);
    }

    /// Allocates a fresh session with the registry defaults, inserts it at
    /// the head, selects it, and returns its id.
    pub async fn create_new_chat(&self, cwd: Option<String>, title: Option<&str>) -> String {
        let session = ChatSession::new(
            title.unwrap_or(ChatSession::DEFAULT_TITLE),
            cwd,
            &self.defaults,
        );
        let id = session.id.clone();
        let mut state = self.state.write().await;
        state.insert_session(session);
        state.selected_session_id = Some(id.clone());
        id
    }

    /// Changes the active session. Existence is not validated.
    pub async fn set_selected_session(&self, session_id: &str) {
        let mut state = self.state.write().await;
        state.selected_session_id = Some(session_id.to_string());
    }

    pub async fn selected_session_id(&self) -> Option<String> {
        self.state.read().await.selected_session_id.clone()
    }

    pub async fn selected_session(&self) -> Option<ChatSession> {
        let state = self.state.read().await;
        let id = state.selected_session_id.as_deref()?;
        state.sessions.iter().find(|s| s.id == id).cloned()
    }

    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.state.read().await.sessions.clone()
    }

    pub async fn session(&self, session_id: &str) -> Option<ChatSession> {
        let state = self.state.read().await;
        state.sessions.iter().find(|s| s.id == session_id).cloned()
    }

    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Appends a message to the session's conversation.
    pub async fn add_message(&self, session_id: &str, message: Message) {
        let mut state = self.state.write().await;
        state
            .messages
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    /// Merges the patch into the message with exactly this id. A missing
    /// session or message id is a no-op.
    pub async fn update_message(&self, session_id: &str, message_id: &str, patch: MessagePatch) {
        let mut state = self.state.write().await;
        if let Some(messages) = state.messages.get_mut(session_id) {
            if let Some(message) = messages.iter_mut().find(|m| m.id == message_id) {
                message.apply(patch);
            }
        }
    }

    pub async fn clear_messages(&self, session_id: &str) {
        let mut state = self.state.write().await;
        state.messages.insert(session_id.to_string(), Vec::new());
    }

    pub async fn messages(&self, session_id: &str) -> Vec<Message> {
        let state = self.state.read().await;
        state.messages.get(session_id).cloned().unwrap_or_default()
    }

    pub async fn message_count(&self, session_id: &str) -> usize {
        let state = self.state.read().await;
        state.messages.get(session_id).map_or(0, Vec::len)
    }

    // ========================================================================
    // Drafts, notices, generating flags, terminals
    // ========================================================================

    pub async fn set_draft(&self, session_id: &str, draft: impl Into<String>) {
        let mut state = self.state.write().await;
        state.drafts.insert(session_id.to_string(), draft.into());
    }

    /// The in-progress input text for the session; empty when none is kept.
    pub async fn draft(&self, session_id: &str) -> String {
        let state = self.state.read().await;
        state.drafts.get(session_id).cloned().unwrap_or_default()
    }

    /// Sets the session's notice, replacing any previous one.
    pub async fn set_notice(&self, session_id: &str, notice: SessionNotice) {
        let mut state = self.state.write().await;
        state.notices.insert(session_id.to_string(), notice);
    }

    pub async fn clear_notice(&self, session_id: &str) {
        let mut state = self.state.write().await;
        state.notices.remove(session_id);
    }

    pub async fn notice(&self, session_id: &str) -> Option<SessionNotice> {
        self.state.read().await.notices.get(session_id).cloned()
    }

    pub async fn set_generating(&self, session_id: &str, generating: bool) {
        let mut state = self.state.write().await;
        state.generating.insert(session_id.to_string(), generating);
    }

    /// Whether a dispatched prompt for this session is still awaiting its
    /// terminal response. Unknown sessions are not generating.
    pub async fn is_generating(&self, session_id: &str) -> bool {
        let state = self.state.read().await;
        state.generating.get(session_id).copied().unwrap_or(false)
    }

    pub async fn bind_terminal(&self, session_id: &str, terminal_id: impl Into<String>) {
        let mut state = self.state.write().await;
        state
            .terminals
            .insert(session_id.to_string(), terminal_id.into());
    }

    pub async fn terminal(&self, session_id: &str) -> Option<String> {
        self.state.read().await.terminals.get(session_id).cloned()
    }

    pub async fn unbind_terminal(&self, session_id: &str) {
        let mut state = self.state.write().await;
        state.terminals.remove(session_id);
    }

    // ========================================================================
    // Option caches and per-session overrides
    // ========================================================================

    /// Replaces the global model cache with a freshly reported option list.
    pub async fn apply_model_options(
        &self,
        options: Vec<SelectOption>,
        current_id: Option<String>,
    ) {
        let mut state = self.state.write().await;
        state.model_cache = OptionsCache {
            options: Some(options),
            current_id,
        };
    }

    /// Replaces the global mode cache with a freshly reported option list.
    pub async fn apply_mode_options(
        &self,
        options: Vec<SelectOption>,
        current_id: Option<String>,
    ) {
        let mut state = self.state.write().await;
        state.mode_cache = OptionsCache {
            options: Some(options),
            current_id,
        };
    }

    pub async fn model_cache(&self) -> OptionsCache {
        self.state.read().await.model_cache.clone()
    }

    pub async fn mode_cache(&self) -> OptionsCache {
        self.state.read().await.mode_cache.clone()
    }

    pub async fn set_session_model_options(&self, session_id: &str, options: Vec<SelectOption>) {
        let mut state = self.state.write().await;
        state
            .model_overrides
            .insert(session_id.to_string(), options);
    }

    pub async fn set_session_mode_options(&self, session_id: &str, options: Vec<SelectOption>) {
        let mut state = self.state.write().await;
        state.mode_overrides.insert(session_id.to_string(), options);
    }

    pub async fn set_session_slash_commands(&self, session_id: &str, commands: Vec<String>) {
        let mut state = self.state.write().await;
        state
            .slash_overrides
            .insert(session_id.to_string(), commands);
    }

    /// Writes the model-option override for every known session and for
    /// `session_id` (which may not be registered yet), in one critical
    /// section. Used by the backend warm-up.
    pub async fn set_model_options_all(&self, session_id: &str, options: Vec<SelectOption>) {
        let mut state = self.state.write().await;
        let ids: Vec<String> = state.sessions.iter().map(|s| s.id.clone()).collect();
        for id in ids {
            state.model_overrides.insert(id, options.clone());
        }
        state
            .model_overrides
            .insert(session_id.to_string(), options);
    }

    /// Mode-option counterpart of [`set_model_options_all`](Self::set_model_options_all).
    pub async fn set_mode_options_all(&self, session_id: &str, options: Vec<SelectOption>) {
        let mut state = self.state.write().await;
        let ids: Vec<String> = state.sessions.iter().map(|s| s.id.clone()).collect();
        for id in ids {
            state.mode_overrides.insert(id, options.clone());
        }
        state.mode_overrides.insert(session_id.to_string(), options);
    }

    pub async fn session_model_options(&self, session_id: &str) -> Vec<SelectOption> {
        let state = self.state.read().await;
        state
            .model_overrides
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn session_mode_options(&self, session_id: &str) -> Vec<SelectOption> {
        let state = self.state.read().await;
        state
            .mode_overrides
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The session's model options: a non-empty per-session override wins,
    /// otherwise whatever the global cache holds.
    pub async fn effective_model_options(&self, session_id: &str) -> Vec<SelectOption> {
        let state = self.state.read().await;
        match state.model_overrides.get(session_id) {
            Some(options) if !options.is_empty() => options.clone(),
            _ => state.model_cache.options.clone().unwrap_or_default(),
        }
    }

    /// The session's mode options, resolved like
    /// [`effective_model_options`](Self::effective_model_options).
    pub async fn effective_mode_options(&self, session_id: &str) -> Vec<SelectOption> {
        let state = self.state.read().await;
        match state.mode_overrides.get(session_id) {
            Some(options) if !options.is_empty() => options.clone(),
            _ => state.mode_cache.options.clone().unwrap_or_default(),
        }
    }

    /// The session's slash commands: a non-empty override wins, otherwise
    /// the configured defaults.
    pub async fn effective_slash_commands(&self, session_id: &str) -> Vec<String> {
        let state = self.state.read().await;
        match state.slash_overrides.get(session_id) {
            Some(commands) if !commands.is_empty() => commands.clone(),
            _ => self.defaults.slash_commands.clone(),
        }
    }

    // ========================================================================
    // Snapshot / restore
    // ========================================================================

    /// The persisted subset of the current state.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read().await;
        RegistrySnapshot {
            sessions: state.sessions.clone(),
            selected_session_id: state.selected_session_id.clone(),
            messages: state.messages.clone(),
            drafts: state.drafts.clone(),
        }
    }

    /// Replaces the registry with the snapshot's contents.
    ///
    /// Runtime-only state starts over: nothing is generating, no notices,
    /// no terminal bindings, option caches back to the defaults.
    pub async fn restore(&self, snapshot: RegistrySnapshot) {
        let mut state = self.state.write().await;
        let generating = snapshot
            .sessions
            .iter()
            .map(|s| (s.id.clone(), false))
            .collect();
        *state = RegistryState {
            sessions: snapshot.sessions,
            selected_session_id: snapshot.selected_session_id,
            messages: snapshot.messages,
            drafts: snapshot.drafts,
            generating,
            model_cache: OptionsCache::with_current(self.defaults.model_id.clone()),
            mode_cache: OptionsCache::with_current(self.defaults.mode_id.clone()),
            ..RegistryState::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::Role;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(ChatDefaults::default())
    }

    fn session(id: &str, title: &str) -> ChatSession {
        let defaults = ChatDefaults::default();
        ChatSession {
            id: id.to_string(),
            ..ChatSession::new(title, None, &defaults)
        }
    }

    #[tokio::test]
    async fn test_add_session_inserts_at_head() {
        let registry = registry();
        registry.add_session(session("one", "First")).await;
        registry.add_session(session("two", "Second")).await;

        let sessions = registry.sessions().await;
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "two");
        assert_eq!(sessions[1].id, "one");
    }

    #[tokio::test]
    async fn test_add_session_seeds_per_session_state() {
        let registry = registry();
        registry.add_session(session("s", "S")).await;

        assert!(registry.messages("s").await.is_empty());
        assert_eq!(registry.draft("s").await, "");
        assert!(!registry.is_generating("s").await);
    }

    #[tokio::test]
    async fn test_update_session_merges_known_id_only() {
        let registry = registry();
        registry.add_session(session("s", "Before")).await;

        registry
            .update_session("s", SessionPatch::title("After"))
            .await;
        registry
            .update_session("ghost", SessionPatch::title("Nope"))
            .await;

        let sessions = registry.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "After");
    }

    #[tokio::test]
    async fn test_remove_session_purges_everything() {
        let registry = registry();
        registry.add_session(session("s", "S")).await;
        registry.add_message("s", Message::user("hi")).await;
        registry.set_draft("s", "draft").await;
        registry.set_notice("s", SessionNotice::error("boom")).await;
        registry.set_generating("s", true).await;
        registry.bind_terminal("s", "term-1").await;
        registry
            .set_session_slash_commands("s", vec!["x".to_string()])
            .await;

        registry.remove_session("s").await;

        assert!(registry.sessions().await.is_empty());
        assert!(registry.messages("s").await.is_empty());
        assert_eq!(registry.draft("s").await, "");
        assert_eq!(registry.notice("s").await, None);
        assert!(!registry.is_generating("s").await);
        assert_eq!(registry.terminal("s").await, None);
        // Overrides gone: slash commands fall back to the defaults
        let defaults = ChatDefaults::default();
        assert_eq!(
            registry.effective_slash_commands("s").await,
            defaults.slash_commands
        );
    }

    #[tokio::test]
    async fn test_create_new_chat_selects_and_returns_id() {
        let registry = registry();
        let id = registry
            .create_new_chat(Some("/work".to_string()), None)
            .await;

        assert_eq!(registry.selected_session_id().await, Some(id.clone()));
        let created = registry.session(&id).await.unwrap();
        assert_eq!(created.title, ChatSession::DEFAULT_TITLE);
        assert_eq!(created.cwd.as_deref(), Some("/work"));
        assert_eq!(created.model, ChatDefaults::default().model_id);
    }

    #[tokio::test]
    async fn test_update_message_requires_exact_id() {
        let registry = registry();
        registry.add_session(session("s", "S")).await;
        let mut message = Message::user("original");
        message.id = "msg-10".to_string();
        registry.add_message("s", message).await;

        // Prefix of the real id must not match
        registry
            .update_message("s", "msg-1", MessagePatch::content("wrong"))
            .await;
        assert_eq!(registry.messages("s").await[0].content, "original");

        registry
            .update_message("s", "msg-10", MessagePatch::content("edited"))
            .await;
        assert_eq!(registry.messages("s").await[0].content, "edited");
    }

    #[tokio::test]
    async fn test_messages_append_in_order_and_clear() {
        let registry = registry();
        registry.add_session(session("s", "S")).await;
        registry.add_message("s", Message::user("a")).await;
        registry.add_message("s", Message::assistant("b")).await;

        let messages = registry.messages("s").await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);

        registry.clear_messages("s").await;
        assert!(registry.messages("s").await.is_empty());
    }

    #[tokio::test]
    async fn test_notice_set_replace_clear() {
        let registry = registry();
        registry.set_notice("s", SessionNotice::info("first")).await;
        registry
            .set_notice("s", SessionNotice::error("second"))
            .await;

        let notice = registry.notice("s").await.unwrap();
        assert_eq!(notice.kind, crate::session::notice::NoticeKind::Error);
        assert_eq!(notice.message, "second");

        registry.clear_notice("s").await;
        assert_eq!(registry.notice("s").await, None);
    }

    #[tokio::test]
    async fn test_effective_model_options_prefers_nonempty_override() {
        let registry = registry();
        registry
            .apply_model_options(
                vec![SelectOption::new("global", "Global")],
                Some("global".to_string()),
            )
            .await;

        // No override yet: global cache wins
        assert_eq!(
            registry.effective_model_options("s").await[0].value,
            "global"
        );

        registry
            .set_session_model_options("s", vec![SelectOption::new("local", "Local")])
            .await;
        assert_eq!(
            registry.effective_model_options("s").await[0].value,
            "local"
        );

        // Empty override falls back to the cache
        registry.set_session_model_options("s", Vec::new()).await;
        assert_eq!(
            registry.effective_model_options("s").await[0].value,
            "global"
        );
    }

    #[tokio::test]
    async fn test_set_mode_options_all_reaches_every_session() {
        let registry = registry();
        registry.add_session(session("a", "A")).await;
        registry.add_session(session("b", "B")).await;

        registry
            .set_mode_options_all("pending", vec![SelectOption::new("m", "M")])
            .await;

        assert_eq!(registry.session_mode_options("a").await.len(), 1);
        assert_eq!(registry.session_mode_options("b").await.len(), 1);
        assert_eq!(registry.session_mode_options("pending").await.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip_resets_runtime_state() {
        let registry = registry();
        let id = registry.create_new_chat(None, Some("Kept")).await;
        registry.add_message(&id, Message::user("hello")).await;
        registry.set_draft(&id, "typing...").await;
        registry.set_generating(&id, true).await;
        registry.set_notice(&id, SessionNotice::error("old")).await;

        let snapshot = registry.snapshot().await;

        let other = SessionRegistry::new(ChatDefaults::default());
        other.restore(snapshot).await;

        assert_eq!(other.sessions().await.len(), 1);
        assert_eq!(other.selected_session_id().await, Some(id.clone()));
        assert_eq!(other.messages(&id).await.len(), 1);
        assert_eq!(other.draft(&id).await, "typing...");
        assert!(!other.is_generating(&id).await);
        assert_eq!(other.notice(&id).await, None);
    }
}
