//! Prompt history: a bounded, deduplicated log of submitted prompts.
//!
//! History is per user, not per session. Navigation works like a shell's
//! up/down arrows: stepping back snapshots the live draft once, stepping
//! forward past the newest entry hands the draft back.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Maximum number of prompts retained; older entries fall off the end.
pub const MAX_HISTORY_SIZE: usize = 100;

#[derive(Debug, Default)]
struct HistoryState {
    /// Most-recent-first, no duplicates.
    entries: Vec<String>,
    /// Index into `entries`; `None` means not navigating (live draft).
    cursor: Option<usize>,
    /// Draft text captured when navigation began.
    draft: Option<String>,
}

/// Bounded prompt log with cursor navigation and a draft snapshot slot.
///
/// All methods take `&self` and lock internally so the ledger can be
/// shared via `Arc` alongside the registry and queues.
#[derive(Debug, Default)]
pub struct PromptHistory {
    state: RwLock<HistoryState>,
}

impl PromptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a submitted prompt.
    ///
    /// The prompt is trimmed; whitespace-only input is ignored. An equal
    /// entry already in the log moves to the front instead of duplicating.
    /// The log is truncated to [`MAX_HISTORY_SIZE`] and any in-progress
    /// navigation is discarded.
    pub async fn add(&self, prompt: &str) {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return;
        }
        let mut state = self.state.write().await;
        state.entries.retain(|entry| entry != trimmed);
        state.entries.insert(0, trimmed.to_string());
        state.entries.truncate(MAX_HISTORY_SIZE);
        state.cursor = None;
        state.draft = None;
    }

    /// Steps toward older entries, returning the entry at the new cursor.
    ///
    /// The first step snapshots `current_draft` so [`next`](Self::next)
    /// can restore it later. Stepping past the oldest entry returns `None`
    /// and leaves the cursor clamped there, so repeated calls at the
    /// boundary are no-ops. Empty history always returns `None`.
    pub async fn previous(&self, current_draft: &str) -> Option<String> {
        let mut state = self.state.write().await;
        if state.entries.is_empty() {
            return None;
        }
        if state.cursor.is_none() {
            state.draft = Some(current_draft.to_string());
        }
        let next_index = state.cursor.map_or(0, |index| index + 1);
        if next_index >= state.entries.len() {
            return None;
        }
        state.cursor = Some(next_index);
        Some(state.entries[next_index].clone())
    }

    /// Steps toward newer entries.
    ///
    /// Returns `None` when not navigating. Stepping forward from the
    /// newest entry leaves navigation and returns the saved draft,
    /// clearing it.
    pub async fn next(&self) -> Option<String> {
        let mut state = self.state.write().await;
        let cursor = state.cursor?;
        if cursor == 0 {
            state.cursor = None;
            return Some(state.draft.take().unwrap_or_default());
        }
        state.cursor = Some(cursor - 1);
        Some(state.entries[cursor - 1].clone())
    }

    /// Abandons any in-progress navigation and drops the saved draft.
    pub async fn reset_navigation(&self) {
        let mut state = self.state.write().await;
        state.cursor = None;
        state.draft = None;
    }

    pub async fn is_navigating(&self) -> bool {
        self.state.read().await.cursor.is_some()
    }

    /// The current entries, most recent first.
    pub async fn entries(&self) -> Vec<String> {
        self.state.read().await.entries.clone()
    }

    /// Replaces the log with previously persisted entries.
    pub async fn restore(&self, entries: Vec<String>) {
        let mut state = self.state.write().await;
        state.entries = entries;
        state.entries.truncate(MAX_HISTORY_SIZE);
        state.cursor = None;
        state.draft = None;
    }
}

/// Persistence boundary for the prompt log.
///
/// # Returns
///
/// `load` yields the stored entries, most recent first; an absent store
/// is an empty list, not an error.
#[async_trait]
pub trait PromptHistoryRepository: Send + Sync {
    async fn load(&self) -> Result<Vec<String>>;
    async fn save(&self, entries: &[String]) -> Result<()>;
}
