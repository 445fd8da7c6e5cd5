pub mod backend;
pub mod config;
pub mod error;
pub mod history;
pub mod queue;
pub mod session;

// Re-export common error type
pub use error::{ConfabError, Result};
