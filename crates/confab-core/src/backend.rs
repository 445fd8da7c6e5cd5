//! Collaborator contracts for the agent backend and terminal control.
//!
//! Implementations live outside this crate (IPC, process management);
//! the orchestration layer only depends on these traits. Streaming
//! responses do not flow through here: the transport feeds them back via
//! registry message updates and the completion entry point.

use crate::error::Result;
use crate::session::SelectOption;
use async_trait::async_trait;

/// What the backend reports when an agent-side session is created.
///
/// Option lists may be empty and current ids absent when the backend
/// does not announce them; the warm-up treats empty reports as "leave
/// existing caches alone".
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSession {
    /// Agent-process-side identifier, distinct from the chat session id.
    pub session_id: String,
    pub model_options: Vec<SelectOption>,
    pub current_model_id: Option<String>,
    pub mode_options: Vec<SelectOption>,
    pub current_mode_id: Option<String>,
}

/// The agent backend the orchestrator dispatches through.
///
/// All calls are fallible; failures surface to the user as notices or
/// inline error messages, never as panics. Completion of a generation is
/// NOT signalled by `send_prompt` returning; it arrives separately
/// through the orchestrator's completion entry point.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Creates the agent-side session for a working directory.
    ///
    /// # Arguments
    ///
    /// * `cwd` - Working directory the agent operates in
    ///
    /// # Returns
    ///
    /// The backend session id together with any model/mode options the
    /// backend discovered at startup.
    async fn create_session(&self, cwd: &str) -> Result<BackendSession>;

    /// Dispatches a user prompt to the backend session.
    ///
    /// A successful return means the prompt was accepted, not that the
    /// generation finished.
    async fn send_prompt(&self, backend_session_id: &str, content: &str) -> Result<()>;

    /// Switches the backend session's model.
    async fn set_model(&self, backend_session_id: &str, model_id: &str) -> Result<()>;

    /// Switches the backend session's mode.
    async fn set_mode(&self, backend_session_id: &str, mode_id: &str) -> Result<()>;
}

/// Terminal lifecycle hooks used during session cleanup.
#[async_trait]
pub trait TerminalControl: Send + Sync {
    /// Kills the terminal process bound to a session. Best-effort; the
    /// caller logs and ignores failures.
    async fn kill(&self, terminal_id: &str) -> Result<()>;
}
