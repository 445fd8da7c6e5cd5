//! Root structure of the configuration file.

use confab_core::config::ChatDefaults;
use serde::{Deserialize, Serialize};

/// Root of `config.toml`.
///
/// Every section is optional in the file; missing sections take their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigRoot {
    /// Defaults applied to newly created chat sessions.
    #[serde(default)]
    pub chat: ChatDefaults,
}
