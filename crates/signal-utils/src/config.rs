//! Configuration file and environment helpers

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "signals.toml";

/// What happened when looking for a `.env` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvStatus {
    Loaded(PathBuf),
    NotFound,
    Unreadable(String),
}

impl DotenvStatus {
    fn from_result(result: Result<PathBuf, dotenvy::Error>) -> Self {
        match result {
            Ok(path) => Self::Loaded(path),
            Err(e) if e.not_found() => Self::NotFound,
            Err(e) => Self::Unreadable(e.to_string()),
        }
    }

    /// Report the outcome; call once tracing is initialised
    pub fn log(&self) {
        match self {
            Self::Loaded(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Self::NotFound => {}
            Self::Unreadable(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }
    }
}

/// Load variables from a `.env` file if one exists.
///
/// Nothing is logged here, so this can run before tracing is set up and a
/// `RUST_LOG` from the file still reaches the filter. A missing file is not
/// an error.
pub fn load_dotenv() -> DotenvStatus {
    DotenvStatus::from_result(dotenvy::dotenv())
}

/// Parse TOML text into `T`, naming `origin` in the error message
pub fn parse_toml<T: DeserializeOwned>(contents: &str, origin: &str) -> anyhow::Result<T> {
    toml::from_str(contents).with_context(|| format!("Failed to parse config file {origin}"))
}

/// Read and parse a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_toml(&contents, &path.display().to_string())
}

/// Pick the config file to load.
///
/// An explicit path is always returned (so a typo surfaces as a read error);
/// otherwise `signals.toml` is used only when it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
    fallback.exists().then_some(fallback)
}
