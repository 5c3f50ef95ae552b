/// Runtime configuration
///
/// Loaded from a TOML file. Every key is optional; missing keys fall back
/// to the values the site ships with.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::state::session::SqliteSessionStore;

/// Minimum time the loading screen stays up, in milliseconds
pub const DEFAULT_MINIMUM_VISIBLE_MS: u64 = 800;

/// Badge rotation interval (10 seconds)
pub const DEFAULT_BADGE_INTERVAL_MS: u64 = 10_000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Root of the asset tree (`home/`, `about/`, `projects/<id>/` ...)
    pub assets_root: PathBuf,
    /// Pre-generated manifest; the assets root is walked when absent
    pub manifest: Option<PathBuf>,
    /// Static project records
    pub projects: PathBuf,
    pub minimum_visible_ms: u64,
    pub badge_interval_ms: u64,
    /// Session database file
    pub session_db: Option<PathBuf>,
    /// Keep session state in the default data dir when `session_db` is unset
    pub persist_session: bool,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("assets"),
            manifest: None,
            projects: PathBuf::from("data/projects.json"),
            minimum_visible_ms: DEFAULT_MINIMUM_VISIBLE_MS,
            badge_interval_ms: DEFAULT_BADGE_INTERVAL_MS,
            session_db: None,
            persist_session: false,
            log_json: false,
        }
    }
}

impl Config {
    /// Read configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load `path` if given, else the default location if it exists, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Get the default config location
    /// Returns ~/.config/portfolio-assets/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("portfolio-assets");
        path.push("config.toml");
        Some(path)
    }

    /// Session database to open, or None for an in-memory session
    pub fn session_path(&self) -> Option<PathBuf> {
        match &self.session_db {
            Some(path) => Some(path.clone()),
            None if self.persist_session => SqliteSessionStore::default_path(),
            None => None,
        }
    }

    pub fn minimum_visible(&self) -> Duration {
        Duration::from_millis(self.minimum_visible_ms)
    }

    pub fn badge_interval(&self) -> Duration {
        Duration::from_millis(self.badge_interval_ms)
    }
}
