//! Chat orchestration use case.
//!
//! This module provides the `ChatUseCase` which coordinates the session
//! registry, the per-session message queues, the prompt history, and the
//! agent backend behind the send/queue/drain flow of the chat screen.

use crate::backend_sessions::BackendSessions;
use anyhow::{Result, anyhow};
use confab_core::backend::{AgentBackend, TerminalControl};
use confab_core::config::ChatDefaults;
use confab_core::history::PromptHistory;
use confab_core::queue::{MessageQueues, QueuedMessage};
use confab_core::session::{
    ChatSession, Message, SelectOption, SessionNotice, SessionPatch, SessionRegistry,
    resolve_option_id, should_sync_option,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Which per-session option a change targets.
#[derive(Clone, Copy)]
enum OptionField {
    Model,
    Mode,
}

impl OptionField {
    fn name(self) -> &'static str {
        match self {
            OptionField::Model => "model",
            OptionField::Mode => "mode",
        }
    }

    fn current(self, session: &ChatSession) -> &str {
        match self {
            OptionField::Model => &session.model,
            OptionField::Mode => &session.mode,
        }
    }

    fn default_id(self, defaults: &ChatDefaults) -> &str {
        match self {
            OptionField::Model => &defaults.model_id,
            OptionField::Mode => &defaults.mode_id,
        }
    }

    fn patch(self, value: impl Into<String>) -> SessionPatch {
        match self {
            OptionField::Model => SessionPatch::model(value),
            OptionField::Mode => SessionPatch::mode(value),
        }
    }
}

/// Use case driving the chat send/queue/drain flow.
///
/// `ChatUseCase` owns the policy between the session registry, the message
/// queues, the prompt history, and the agent backend: which prompt is
/// dispatched when, what happens to prompts typed while a reply is still
/// generating, and how model and mode switches reach the agent.
///
/// # Responsibilities
///
/// - Dispatching prompts and queueing them while a reply is generating
/// - Draining queued prompts one at a time after each completion
/// - Creating agent sessions lazily with deduplicated concurrent creation
/// - Switching model/mode optimistically with rollback on backend failure
/// - Deleting sessions without ever leaving the registry empty
///
/// # Thread Safety
///
/// All collaborators use interior mutability behind `Arc`; every method
/// takes `&self` and may be called concurrently. Queue drains are
/// serialized per session through an explicit in-flight guard.
pub struct ChatUseCase {
    /// Registry holding sessions and their runtime state
    registry: Arc<SessionRegistry>,
    /// Per-session queues of prompts typed while generating
    queues: Arc<MessageQueues>,
    /// Cross-session prompt history
    history: Arc<PromptHistory>,
    /// Agent backend prompts are sent to
    backend: Arc<dyn AgentBackend>,
    /// Terminal control used during session deletion
    terminals: Arc<dyn TerminalControl>,
    /// Chat-session to agent-session mapping
    backend_sessions: Arc<BackendSessions>,
    /// Session ids with a queue dispatch currently in flight
    dispatching: Mutex<HashSet<String>>,
}

impl ChatUseCase {
    /// Creates a new `ChatUseCase` instance.
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry holding sessions and runtime state
    /// * `queues` - Per-session message queues
    /// * `history` - Cross-session prompt history
    /// * `backend` - Agent backend for session creation and prompts
    /// * `terminals` - Terminal control used during session deletion
    pub fn new(
        registry: Arc<SessionRegistry>,
        queues: Arc<MessageQueues>,
        history: Arc<PromptHistory>,
        backend: Arc<dyn AgentBackend>,
        terminals: Arc<dyn TerminalControl>,
    ) -> Self {
        Self {
            registry,
            queues,
            history,
            backend,
            terminals,
            backend_sessions: Arc::new(BackendSessions::new()),
            dispatching: Mutex::new(HashSet::new()),
        }
    }

    /// Sends a prompt from the input box.
    ///
    /// The prompt is always recorded in the history first. When the selected
    /// session is generating the prompt is queued instead of dispatched and
    /// the queued entry is returned; otherwise it is dispatched immediately
    /// and `None` is returned.
    pub async fn send_message(&self, content: &str) -> Option<QueuedMessage> {
        self.history.add(content).await;

        let session_id = self.registry.selected_session_id().await?;

        if self.registry.is_generating(&session_id).await {
            let queued = self.queues.enqueue(&session_id, content).await;
            tracing::info!(
                "[ChatUseCase] Queued message {} for session: {}",
                queued.id,
                session_id
            );
            return Some(queued);
        }

        if !self.dispatch_message(&session_id, content).await {
            // The failed dispatch cleared the generating flag, so anything
            // queued while it was in flight is free to go out.
            self.drain_queue(&session_id).await;
        }
        None
    }

    /// Marks a generation as finished and drains any queued prompts.
    ///
    /// Called by the embedding layer when the agent reports a terminal
    /// response or error for the session's in-flight prompt.
    pub async fn complete_generation(&self, session_id: &str) {
        tracing::debug!(
            "[ChatUseCase] Generation complete for session: {}",
            session_id
        );
        self.registry.set_generating(session_id, false).await;
        self.drain_queue(session_id).await;
    }

    /// Dispatches one prompt to the agent for a session.
    ///
    /// Returns `false` when the dispatch failed; the error is then already
    /// recorded as an assistant message and the generating flag is cleared.
    async fn dispatch_message(&self, session_id: &str, content: &str) -> bool {
        let prior_count = self.registry.message_count(session_id).await;

        // The flag goes up before anything awaits so a prompt arriving
        // mid-dispatch queues instead of double-dispatching.
        self.registry.set_generating(session_id, true).await;
        self.registry
            .add_message(session_id, Message::user(content))
            .await;

        if prior_count == 0 {
            self.registry
                .update_session(session_id, SessionPatch::title(Self::derive_title(content)))
                .await;
        }

        if let Err(e) = self.send_to_backend(session_id, content).await {
            tracing::warn!(
                "[ChatUseCase] Dispatch failed for session {}: {}",
                session_id,
                e
            );
            self.registry
                .add_message(
                    session_id,
                    Message::assistant(format!("Request failed: {}", e)),
                )
                .await;
            self.registry.set_generating(session_id, false).await;
            return false;
        }

        tracing::debug!(
            "[ChatUseCase] Prompt dispatched for session: {}",
            session_id
        );
        true
    }

    /// Resolves the agent session and forwards the prompt.
    async fn send_to_backend(&self, session_id: &str, content: &str) -> Result<()> {
        let backend_id = self.ensure_backend_session(session_id).await?;
        self.backend.send_prompt(&backend_id, content).await?;
        Ok(())
    }

    /// Dispatches queued prompts until the session is generating again or
    /// the queue is empty.
    ///
    /// At most one drain dispatches per session at a time; the in-flight
    /// guard is cleared when each dispatch settles. A failed dispatch
    /// clears the generating flag itself, so the loop simply moves on to
    /// the next queued prompt.
    async fn drain_queue(&self, session_id: &str) {
        loop {
            {
                let mut dispatching = self.dispatching.lock().await;
                if !dispatching.insert(session_id.to_string()) {
                    return;
                }
            }

            if self.registry.is_generating(session_id).await {
                self.dispatching.lock().await.remove(session_id);
                return;
            }

            let Some(queued) = self.queues.dequeue(session_id).await else {
                self.dispatching.lock().await.remove(session_id);
                return;
            };

            tracing::info!(
                "[ChatUseCase] Dispatching queued message {} for session: {}",
                queued.id,
                session_id
            );
            self.dispatch_message(session_id, &queued.content).await;
            self.dispatching.lock().await.remove(session_id);
        }
    }

    /// Switches the selected session's model.
    pub async fn change_model(&self, model_id: &str) {
        self.change_option(OptionField::Model, model_id).await;
    }

    /// Switches the selected session's mode.
    pub async fn change_mode(&self, mode_id: &str) {
        self.change_option(OptionField::Mode, mode_id).await;
    }

    /// Applies an option switch optimistically and rolls it back when the
    /// backend rejects it.
    async fn change_option(&self, field: OptionField, new_id: &str) {
        let Some(session) = self.registry.selected_session().await else {
            return;
        };
        let previous = field.current(&session).to_string();
        if previous == new_id {
            return;
        }

        tracing::debug!(
            "[ChatUseCase] Switching {} for session {}: {} -> {}",
            field.name(),
            session.id,
            previous,
            new_id
        );
        self.registry
            .update_session(&session.id, field.patch(new_id))
            .await;
        self.registry.clear_notice(&session.id).await;

        // Without an agent session there is nothing to sync yet; the first
        // send picks the new value up.
        let Some(backend_id) = self.backend_sessions.lookup(&session.id).await else {
            return;
        };

        let result = match field {
            OptionField::Model => self.backend.set_model(&backend_id, new_id).await,
            OptionField::Mode => self.backend.set_mode(&backend_id, new_id).await,
        };

        if let Err(e) = result {
            tracing::warn!(
                "[ChatUseCase] Failed to switch {} for session {}: {}",
                field.name(),
                session.id,
                e
            );
            self.registry
                .update_session(&session.id, field.patch(previous))
                .await;
            self.registry
                .set_notice(
                    &session.id,
                    SessionNotice::error(format!("Failed to switch {}: {}", field.name(), e)),
                )
                .await;
        }
    }

    /// Resolves the agent session id for a chat session, creating the agent
    /// session on first use.
    ///
    /// Concurrent calls for the same chat session share one creation; a
    /// failed creation leaves no mapping behind, so the next call retries.
    pub async fn ensure_backend_session(&self, chat_session_id: &str) -> Result<String> {
        let cell = self.backend_sessions.cell(chat_session_id).await;
        cell.get_or_try_init(|| self.create_backend_session(chat_session_id))
            .await
            .cloned()
    }

    /// Returns the agent session id for a chat session when one exists.
    pub async fn backend_session_id(&self, chat_session_id: &str) -> Option<String> {
        self.backend_sessions.lookup(chat_session_id).await
    }

    /// Creates the agent session and runs the option warm-up.
    async fn create_backend_session(&self, chat_session_id: &str) -> Result<String> {
        // Snapshot the session up front so its cwd and preferences cannot
        // shift under the awaits below.
        let session = self.registry.session(chat_session_id).await;

        let cwd = session
            .as_ref()
            .and_then(|s| s.cwd.clone())
            .filter(|cwd| !cwd.trim().is_empty())
            .unwrap_or_else(|| ".".to_string());

        tracing::info!(
            "[ChatUseCase] Creating agent session for chat {} in {}",
            chat_session_id,
            cwd
        );

        let created = self
            .backend
            .create_session(&cwd)
            .await
            .map_err(|e| anyhow!("Failed to create agent session: {}", e))?;

        // Usable right away: model/mode switches racing the warm-up below
        // resolve this mapping.
        self.backend_sessions
            .record(chat_session_id, &created.session_id)
            .await;

        // Option warm-up. Reported lists reach every session's override and
        // the global caches; empty reports leave the caches untouched.
        if !created.mode_options.is_empty() {
            self.registry
                .set_mode_options_all(chat_session_id, created.mode_options.clone())
                .await;
            let current = created
                .current_mode_id
                .clone()
                .or_else(|| Some(self.registry.defaults().mode_id.clone()));
            self.registry
                .apply_mode_options(created.mode_options.clone(), current)
                .await;
        }
        if !created.model_options.is_empty() {
            self.registry
                .set_model_options_all(chat_session_id, created.model_options.clone())
                .await;
            self.registry
                .apply_model_options(
                    created.model_options.clone(),
                    created.current_model_id.clone(),
                )
                .await;
        }

        self.resolve_and_sync_option(
            OptionField::Mode,
            chat_session_id,
            &created.session_id,
            session.as_ref().map(|s| s.mode.as_str()),
            &created.mode_options,
            created.current_mode_id.as_deref(),
        )
        .await;
        self.resolve_and_sync_option(
            OptionField::Model,
            chat_session_id,
            &created.session_id,
            session.as_ref().map(|s| s.model.as_str()),
            &created.model_options,
            created.current_model_id.as_deref(),
        )
        .await;

        Ok(created.session_id)
    }

    /// Resolves one option field against freshly reported options and syncs
    /// it to the agent when required.
    ///
    /// On a failed sync the session field falls back to the backend's
    /// current id (else the first option, else the default) and an error
    /// notice is set.
    async fn resolve_and_sync_option(
        &self,
        field: OptionField,
        chat_session_id: &str,
        backend_session_id: &str,
        preferred: Option<&str>,
        available: &[SelectOption],
        backend_current: Option<&str>,
    ) {
        let default_id = field.default_id(self.registry.defaults()).to_string();
        let desired = resolve_option_id(
            preferred,
            available,
            &[
                backend_current,
                available.first().map(|o| o.value.as_str()),
            ],
            &default_id,
        );

        if preferred != Some(desired.as_str()) {
            self.registry
                .update_session(chat_session_id, field.patch(desired.clone()))
                .await;
        }

        if !should_sync_option(Some(&desired), backend_current, available) {
            return;
        }

        let result = match field {
            OptionField::Model => self.backend.set_model(backend_session_id, &desired).await,
            OptionField::Mode => self.backend.set_mode(backend_session_id, &desired).await,
        };

        if let Err(e) = result {
            tracing::warn!(
                "[ChatUseCase] Failed to set {} for session {}: {}",
                field.name(),
                chat_session_id,
                e
            );
            self.registry
                .set_notice(
                    chat_session_id,
                    SessionNotice::error(format!("Failed to set {}: {}", field.name(), e)),
                )
                .await;
            let fallback = backend_current
                .map(str::to_string)
                .or_else(|| available.first().map(|o| o.value.clone()))
                .unwrap_or(default_id);
            self.registry
                .update_session(chat_session_id, field.patch(fallback))
                .await;
        }
    }

    /// Deletes a chat session and everything attached to it.
    ///
    /// Deleting the last remaining session inserts a fresh replacement
    /// before the removal, so the registry is never empty.
    pub async fn delete_session(&self, session_id: &str) {
        tracing::info!("[ChatUseCase] Deleting session: {}", session_id);

        let sessions = self.registry.sessions().await;
        let selected_id = self.registry.selected_session_id().await;
        let deleted_cwd = sessions
            .iter()
            .find(|s| s.id == session_id)
            .and_then(|s| s.cwd.clone());
        let selected_cwd = selected_id
            .as_ref()
            .and_then(|id| sessions.iter().find(|s| &s.id == id))
            .and_then(|s| s.cwd.clone());
        let should_create_new = sessions.len() <= 1;

        self.backend_sessions.forget(session_id).await;

        if let Some(terminal_id) = self.registry.terminal(session_id).await {
            if let Err(e) = self.terminals.kill(&terminal_id).await {
                tracing::warn!(
                    "[ChatUseCase] Failed to kill terminal {}: {}",
                    terminal_id,
                    e
                );
            }
            self.registry.unbind_terminal(session_id).await;
        }

        let replacement_id = if should_create_new {
            let replacement = ChatSession::new(
                ChatSession::DEFAULT_TITLE,
                deleted_cwd.or(selected_cwd),
                self.registry.defaults(),
            );
            let id = replacement.id.clone();
            self.registry.add_session(replacement).await;
            Some(id)
        } else {
            None
        };

        self.registry.remove_session(session_id).await;
        self.queues.remove_session(session_id).await;
        self.dispatching.lock().await.remove(session_id);

        if selected_id.as_deref() == Some(session_id) {
            let next_selected = replacement_id.or_else(|| {
                sessions
                    .iter()
                    .find(|s| s.id != session_id)
                    .map(|s| s.id.clone())
            });
            if let Some(next_id) = next_selected {
                self.registry.set_selected_session(&next_id).await;
                self.registry.clear_notice(&next_id).await;
            }
        }
    }

    /// Moves a queued message back into the draft for editing.
    pub async fn edit_queued_message(&self, message_id: &str) {
        let Some(session_id) = self.registry.selected_session_id().await else {
            return;
        };
        // Read and removal happen in one queue critical section, so no
        // other queue mutation interleaves.
        let Some(queued) = self.queues.take(&session_id, message_id).await else {
            return;
        };
        self.registry.set_draft(&session_id, queued.content).await;
    }

    /// Re-aligns the selected session's model and mode with the currently
    /// available options.
    ///
    /// A session whose stored value disappeared from the option lists is
    /// moved to an available one; nothing changes while the lists are empty
    /// or the stored value is still available.
    pub async fn sync_selected_options(&self) {
        let Some(session) = self.registry.selected_session().await else {
            return;
        };

        let model_options = self.registry.effective_model_options(&session.id).await;
        if !model_options.is_empty() && !model_options.iter().any(|o| o.value == session.model) {
            let default_model = self.registry.defaults().model_id.clone();
            let cache_current = self.registry.model_cache().await.current_id;
            let next = resolve_option_id(
                None,
                &model_options,
                &[Some(default_model.as_str()), cache_current.as_deref()],
                &default_model,
            );
            if next != session.model {
                self.registry
                    .update_session(&session.id, SessionPatch::model(next))
                    .await;
            }
        }

        let mode_options = self.registry.session_mode_options(&session.id).await;
        if !mode_options.is_empty() && !mode_options.iter().any(|o| o.value == session.mode) {
            let default_mode = self.registry.defaults().mode_id.clone();
            let next = resolve_option_id(
                None,
                &mode_options,
                &[Some(default_mode.as_str())],
                &default_mode,
            );
            if next != session.mode {
                self.registry
                    .update_session(&session.id, SessionPatch::mode(next))
                    .await;
            }
        }
    }

    /// Clears the selected session's queue.
    pub async fn clear_queue(&self) {
        if let Some(session_id) = self.registry.selected_session_id().await {
            self.queues.clear(&session_id).await;
        }
    }

    /// Removes one queued message from the selected session's queue.
    pub async fn remove_from_queue(&self, message_id: &str) {
        if let Some(session_id) = self.registry.selected_session_id().await {
            self.queues.remove(&session_id, message_id).await;
        }
    }

    /// Moves a queued message to the front of the selected session's queue.
    pub async fn move_to_top_in_queue(&self, message_id: &str) {
        if let Some(session_id) = self.registry.selected_session_id().await {
            self.queues.move_to_top(&session_id, message_id).await;
        }
    }

    /// Steps back through the prompt history.
    pub async fn previous_prompt(&self, current_draft: &str) -> Option<String> {
        self.history.previous(current_draft).await
    }

    /// Steps forward through the prompt history.
    pub async fn next_prompt(&self) -> Option<String> {
        self.history.next().await
    }

    /// Leaves history navigation.
    pub async fn reset_prompt_navigation(&self) {
        self.history.reset_navigation().await;
    }

    /// Derives a session title from the first prompt.
    fn derive_title(content: &str) -> String {
        let mut chars = content.chars();
        let title: String = chars.by_ref().take(20).collect();
        if chars.next().is_some() {
            format!("{}...", title)
        } else {
            title
        }
    }
}
