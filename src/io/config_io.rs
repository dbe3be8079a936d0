use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::OnetreeConfig;

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "onetree.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

pub fn parse_config(text: &str) -> Result<OnetreeConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

pub fn read_config(path: &Path) -> Result<OnetreeConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&text)
}

/// Read an explicitly requested config, or `onetree.toml` from the working
/// directory if it exists, or fall back to the defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<OnetreeConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let local = Path::new(CONFIG_FILE);
    if local.is_file() {
        log::debug!("using {}", local.display());
        return read_config(local);
    }
    Ok(OnetreeConfig::default())
}
