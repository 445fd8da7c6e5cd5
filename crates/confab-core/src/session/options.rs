//! Selectable option types and resolution helpers.
//!
//! Model and mode choices arrive from the agent backend as option lists
//! with an optional "current" id. The helpers here pick a usable id from a
//! preference chain, and decide whether a resolved id needs to be synced
//! back to the backend.

use serde::{Deserialize, Serialize};

/// One selectable entry (model, mode) as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Last-reported option list plus the backend's current selection.
///
/// `options: None` means the backend has not reported yet; an empty list
/// means it reported nothing usable. Session-level overrides take
/// precedence over this global cache when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsCache {
    pub options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_id: Option<String>,
}

impl OptionsCache {
    /// An unpopulated cache that still knows the current (default) id.
    pub fn with_current(current_id: impl Into<String>) -> Self {
        Self {
            options: None,
            current_id: Some(current_id.into()),
        }
    }
}

/// Resolves an option id from a preference chain.
///
/// The preferred id wins when it is available (or when no options are known
/// yet); otherwise the first available fallback is taken, then the first
/// option, then `default_id`. Empty-string candidates are skipped.
pub fn resolve_option_id(
    preferred: Option<&str>,
    available: &[SelectOption],
    fallbacks: &[Option<&str>],
    default_id: &str,
) -> String {
    let has_options = !available.is_empty();
    let is_available = |id: &str| available.iter().any(|option| option.value == id);

    let mut desired = preferred.filter(|id| !id.is_empty());
    if has_options && desired.is_some_and(|id| !is_available(id)) {
        desired = None;
    }

    if desired.is_none() {
        for candidate in fallbacks.iter().flatten() {
            if candidate.is_empty() {
                continue;
            }
            if !has_options || is_available(candidate) {
                desired = Some(candidate);
                break;
            }
        }
    }

    desired
        .map(str::to_string)
        .or_else(|| available.first().map(|option| option.value.clone()))
        .unwrap_or_else(|| default_id.to_string())
}

/// Decides whether a resolved id must be pushed to the backend.
///
/// No sync when there is nothing to sync or the backend already has it;
/// with an option list known, only available ids are synced.
pub fn should_sync_option(
    desired: Option<&str>,
    current: Option<&str>,
    available: &[SelectOption],
) -> bool {
    let Some(desired) = desired.filter(|id| !id.is_empty()) else {
        return false;
    };
    if current.is_some_and(|id| !id.is_empty() && id == desired) {
        return false;
    }
    if available.is_empty() {
        return true;
    }
    available.iter().any(|option| option.value == desired)
}
