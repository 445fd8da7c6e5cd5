//! Application layer for Confab.
//!
//! This crate provides use case implementations that coordinate between
//! domain and infrastructure layers to implement application-level chat logic.

pub mod backend_sessions;
pub mod bootstrap;
pub mod chat_usecase;
pub mod persistence_service;

pub use backend_sessions::BackendSessions;
pub use bootstrap::{ChatApp, bootstrap, bootstrap_with};
pub use chat_usecase::ChatUseCase;
pub use persistence_service::PersistenceService;
