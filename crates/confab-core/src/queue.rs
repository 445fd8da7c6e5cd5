//! Per-session FIFO queues for prompts submitted while generating.
//!
//! The queues only hold and order messages. Whether a submission is
//! queued or dispatched directly, and when a queued item is drained, is
//! decided by the orchestration layer reading the registry's generating
//! flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A prompt waiting for its session to finish generating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMessage {
    /// Generated id; unique, format carries no meaning.
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl QueuedMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// All pending queues, keyed by chat session id.
///
/// Operations never fail: unknown session or message ids are no-ops, and
/// reading an unknown session yields an empty queue. Every method is one
/// lock-guarded critical section.
#[derive(Debug, Default)]
pub struct MessageQueues {
    queues: RwLock<HashMap<String, VecDeque<QueuedMessage>>>,
}

impl MessageQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new message to the session's queue and returns it.
    ///
    /// Admission policy is the caller's: this always appends.
    pub async fn enqueue(&self, session_id: &str, content: impl Into<String>) -> QueuedMessage {
        let message = QueuedMessage::new(content);
        let mut queues = self.queues.write().await;
        queues
            .entry(session_id.to_string())
            .or_default()
            .push_back(message.clone());
        message
    }

    /// Removes and returns the head of the session's queue.
    pub async fn dequeue(&self, session_id: &str) -> Option<QueuedMessage> {
        let mut queues = self.queues.write().await;
        queues.get_mut(session_id)?.pop_front()
    }

    /// Removes the message with this id, keeping the rest in order.
    pub async fn remove(&self, session_id: &str, message_id: &str) {
        let mut queues = self.queues.write().await;
        if let Some(queue) = queues.get_mut(session_id) {
            queue.retain(|message| message.id != message_id);
        }
    }

    /// Removes and returns the message with this id.
    ///
    /// The read and the removal happen under one lock, so no other queue
    /// mutation can interleave between them. Used for edit-in-queue.
    pub async fn take(&self, session_id: &str, message_id: &str) -> Option<QueuedMessage> {
        let mut queues = self.queues.write().await;
        let queue = queues.get_mut(session_id)?;
        let index = queue.iter().position(|message| message.id == message_id)?;
        queue.remove(index)
    }

    /// Moves the message with this id to the front of its queue,
    /// preserving the relative order of the rest. No-op when the message
    /// is absent or already first.
    pub async fn move_to_top(&self, session_id: &str, message_id: &str) {
        let mut queues = self.queues.write().await;
        let Some(queue) = queues.get_mut(session_id) else {
            return;
        };
        let Some(index) = queue.iter().position(|message| message.id == message_id) else {
            return;
        };
        if index == 0 {
            return;
        }
        if let Some(message) = queue.remove(index) {
            queue.push_front(message);
        }
    }

    /// Empties the session's queue.
    pub async fn clear(&self, session_id: &str) {
        let mut queues = self.queues.write().await;
        if let Some(queue) = queues.get_mut(session_id) {
            queue.clear();
        }
    }

    /// Drops the session's queue entirely (session deletion).
    pub async fn remove_session(&self, session_id: &str) {
        let mut queues = self.queues.write().await;
        queues.remove(session_id);
    }

    /// The session's pending messages in dispatch order.
    pub async fn queue(&self, session_id: &str) -> Vec<QueuedMessage> {
        let queues = self.queues.read().await;
        queues
            .get(session_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn has_queued(&self, session_id: &str) -> bool {
        let queues = self.queues.read().await;
        queues.get(session_id).is_some_and(|queue| !queue.is_empty())
    }

    pub async fn len(&self, session_id: &str) -> usize {
        let queues = self.queues.read().await;
        queues.get(session_id).map_or(0, VecDeque::len)
    }
}
