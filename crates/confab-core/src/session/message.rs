//! Conversation message types.
//!
//! This module contains types for representing messages in a session's
//! conversation, including roles, plan steps, and thinking traces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// Intermediate reasoning emitted by the assistant.
    Thought,
}

/// Status of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStepStatus {
    Pending,
    Active,
    Completed,
    Error,
}

/// One step of a plan the assistant proposed while working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: PlanStepStatus,
}

/// Streaming reasoning attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingData {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// A single message in a session's conversation.
///
/// Messages are appended by the orchestrator (user messages and inline
/// error replies) or by the external streaming channel (assistant
/// messages, via updates keyed by message id). The per-session sequence
/// reflects submission/arrival order and is never reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within the owning session.
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_steps: Option<Vec<PlanStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingData>,
}

impl Message {
    /// Creates a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Some(Utc::now()),
            is_streaming: None,
            plan_steps: None,
            thinking: None,
        }
    }

    /// Creates a non-streaming assistant message stamped with the current
    /// time. Used for inline error replies.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(Utc::now()),
            is_streaming: Some(false),
            plan_steps: None,
            thinking: None,
        }
    }

    /// Applies a partial update, leaving unset fields untouched.
    pub fn apply(&mut self, patch: MessagePatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(timestamp) = patch.timestamp {
            self.timestamp = Some(timestamp);
        }
        if let Some(is_streaming) = patch.is_streaming {
            self.is_streaming = Some(is_streaming);
        }
        if let Some(plan_steps) = patch.plan_steps {
            self.plan_steps = Some(plan_steps);
        }
        if let Some(thinking) = patch.thinking {
            self.thinking = Some(thinking);
        }
    }
}

/// A partial update for [`Message`]. Id and role are not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub is_streaming: Option<bool>,
    pub plan_steps: Option<Vec<PlanStep>>,
    pub thinking: Option<ThinkingData>,
}

impl MessagePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}
