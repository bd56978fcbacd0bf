//! Configuration management for tiercopy
//!
//! Settings are layered: built-in defaults, then an optional YAML/TOML/JSON file,
//! then `TIERCOPY__SECTION__KEY` environment variables. Size thresholds, buffer
//! tiers and worker-pool sizing are fixed in the engine and cannot be configured.
//!
//! # Examples
//!
//! ```rust
//! use tiercopy_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("tiercopy.yaml")
//!     .add_env_prefix("TIERCOPY")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Refresh every {:?}", config.progress.refresh_interval());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for tiercopy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Progress rendering configuration
    #[serde(default)]
    pub progress: ProgressConfig,
    /// Per-file copy behaviour
    #[serde(default)]
    pub copy: CopyBehaviourConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable JSON formatting
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Progress rendering configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// How often an observer samples the job, in milliseconds
    pub refresh_interval_ms: u64,
    /// Show the file currently being copied
    pub show_current_file: bool,
}

impl ProgressConfig {
    /// Shortest allowed refresh interval
    pub const MIN_REFRESH: Duration = Duration::from_millis(10);
    /// Longest allowed refresh interval
    pub const MAX_REFRESH: Duration = Duration::from_secs(10);

    /// Sampling interval as a [`Duration`]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 200,
            show_current_file: true,
        }
    }
}

/// Per-file copy behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyBehaviourConfig {
    /// Skip files whose destination matches by size and mtime
    pub skip_identical: bool,
    /// Preserve access and modification times
    pub preserve_timestamps: bool,
}

impl Default for CopyBehaviourConfig {
    fn default() -> Self {
        Self {
            skip_identical: true,
            preserve_timestamps: true,
        }
    }
}
