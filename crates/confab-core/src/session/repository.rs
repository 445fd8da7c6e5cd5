//! Session snapshot repository trait.
//!
//! Defines the interface for persisting registry snapshots.

use super::snapshot::RegistrySnapshot;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for persisting the registry snapshot.
///
/// This trait decouples the core from the specific storage mechanism
/// (JSON file, database, remote store). Implementations normalize stored
/// data on load: entries that cannot be interpreted are dropped rather
/// than reported as errors wherever possible.
#[async_trait]
pub trait SessionSnapshotRepository: Send + Sync {
    /// Loads the last persisted snapshot.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(snapshot))`: usable data was found
    /// - `Ok(None)`: nothing stored, or the stored data is unusable
    ///   (wrong version, no valid sessions)
    /// - `Err(_)`: the storage itself failed
    async fn load(&self) -> Result<Option<RegistrySnapshot>>;

    /// Saves a snapshot, replacing any previous one.
    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<()>;
}
