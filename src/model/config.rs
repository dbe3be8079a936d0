use serde::{Deserialize, Serialize};

use crate::io::session::HandleMode;
use crate::parse::ParserEngine;

/// Configuration from onetree.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnetreeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub paths: PathConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// When the store handle is acquired and released.
    #[serde(default)]
    pub mode: HandleMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub engine: ParserEngine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Joins path components in relative paths.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Start relative paths with the notebook's display name rather than its folder name.
    #[serde(default = "default_true")]
    pub use_display_name: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        PathConfig {
            separator: default_separator(),
            use_display_name: true,
        }
    }
}

fn default_separator() -> String {
    "\\".to_string()
}

fn default_true() -> bool {
    true
}
