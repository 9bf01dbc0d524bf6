//! Configuration loading.
//!
//! Settings come from a TOML file, by default `<config dir>/pollsync/config.toml`. A missing
//! default file is not an error; an explicitly requested file must exist and parse.
//!
//! ```toml
//! call_timeout_ms = 5000
//! account = "alice"
//!
//! [[seed]]
//! title = "Lunch"
//! options = ["Pizza", "Salad"]
//! ```

use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A poll pre-loaded into the in-memory service used by the shell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedPoll {
    pub title: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Per-call timeout applied to every poll service call; unset means no timeout
    pub call_timeout_ms: Option<u64>,
    /// Refresh once before accepting commands
    pub refresh_on_start: bool,
    /// Account the shell acts as
    pub account: String,
    pub seed: Vec<SeedPoll>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: None,
            refresh_on_start: true,
            account: crate::service::memory::DEFAULT_ACCOUNT.to_string(),
            seed: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// `<config dir>/pollsync/config.toml`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pollsync").join("config.toml"))
    }

    /// Load `path` if given, otherwise the default file when it exists, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SyncError::config(path, format!("cannot read file: {}", e)))?;
        Self::from_toml(&contents).map_err(|message| SyncError::config(path, message))
    }

    fn from_toml(contents: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.message().to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.call_timeout_ms == Some(0) {
            return Err("call_timeout_ms must be greater than zero".to_string());
        }
        if self.account.trim().is_empty() {
            return Err("account must not be empty".to_string());
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}
