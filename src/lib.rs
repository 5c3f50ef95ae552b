//! Asset preloading for the portfolio site
//!
//! - `assets`: manifest, group resolution, image loading, the shared load
//!   cache and progress-tracked preload passes
//! - `state`: session storage, badge rotation and project filtering
//! - `config`: TOML configuration
//! - `error`: error types

pub mod assets;
pub mod config;
pub mod error;
pub mod state;

pub use config::Config;
pub use error::{AssetError, ConfigError, ProjectError, SessionError};
