use serde::{Deserialize, Serialize};

/// Built-in fallback model id used when no configuration is present.
pub const DEFAULT_MODEL_ID: &str = "gpt-5.2-high";

/// Built-in fallback mode id used when no configuration is present.
pub const DEFAULT_MODE_ID: &str = "agent-full";

/// Chat defaults applied to newly created sessions and used as the final
/// fallback when option resolution finds nothing better.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChatDefaults {
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_mode_id")]
    pub mode_id: String,
    #[serde(default = "default_slash_commands")]
    pub slash_commands: Vec<String>,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            mode_id: default_mode_id(),
            slash_commands: default_slash_commands(),
        }
    }
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_mode_id() -> String {
    DEFAULT_MODE_ID.to_string()
}

fn default_slash_commands() -> Vec<String> {
    [
        "review",
        "review-branch",
        "review-commit",
        "init",
        "compact",
        "undo",
        "logout",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
