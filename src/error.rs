/// Error types
///
/// Image loads never fail through these types: a broken asset settles as
/// `Outcome::Failed` and is reported in the preload pass instead. What is
/// left are the things that really can go wrong around the loads:
/// reading the manifest, talking to the session database, and parsing
/// configuration or project data.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the asset side (manifest handling, preload tasks)
#[derive(Debug, Error)]
pub enum AssetError {
    /// Failed to read or write a manifest file
    #[error("io error on manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest file is not valid JSON
    #[error("invalid manifest {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The background preload task did not finish
    #[error("preload task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Errors from the per-session store
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("session value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not create session directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors while loading project records
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("could not read projects {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid projects file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AssetError {
    /// Create IO error for a manifest path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
