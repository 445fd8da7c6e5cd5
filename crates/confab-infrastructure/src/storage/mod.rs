//! Storage layer for atomic file operations.

mod atomic_json;
mod atomic_toml;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
