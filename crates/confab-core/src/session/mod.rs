//! Sessions and the registry that owns them.
//!
//! Domain models for chat sessions and the registry that holds every live
//! session, plus the persistence seam for the registry's snapshot.
//!
//! Submodules:
//!
//! - `model`: the session itself (`ChatSession`)
//! - `message`: conversation message types (`Message`, `Role`)
//! - `notice`: session-scoped banners (`SessionNotice`)
//! - `options`: model/mode option caches and resolution helpers
//! - `snapshot`: the persisted subset of registry state
//! - `repository`: repository trait for snapshot persistence
//! - `registry`: the authoritative state container (`SessionRegistry`)

mod message;
mod model;
mod notice;
mod options;
mod registry;
mod repository;
mod snapshot;

// Callers import everything flat from `confab_core::session`.
pub use message::{Message, MessagePatch, PlanStep, PlanStepStatus, Role, ThinkingData};
pub use model::{ChatSession, SessionPatch};
pub use notice::{NoticeKind, SessionNotice};
pub use options::{resolve_option_id, should_sync_option, OptionsCache, SelectOption};
pub use registry::SessionRegistry;
pub use repository::SessionSnapshotRepository;
pub use snapshot::RegistrySnapshot;
