//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the on-disk schema of the files confab writes. They
//! are looser than the domain types: unknown or damaged entries are repaired
//! or dropped while mapping to the domain, and a single integer version tag
//! gates whole payloads (a mismatched version reads as no data).

mod config_root;
mod session_state;

pub use config_root::ConfigRoot;
pub use session_state::{
    PersistedMessage, PersistedSession, PersistedState, PersistedThinking, STATE_VERSION,
};
