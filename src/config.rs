//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - planlayer.toml (default configuration)
//! - planlayer.local.toml (git-ignored local overrides)
//! - Environment variables (PLANLAYER_* prefix)
//!
//! Every key is optional; missing keys take the documented defaults.
//!
//! ## Example
//!
//! ```toml
//! # planlayer.toml
//! [optimizer]
//! max_iterations = 20
//! enable_between_composition = false
//!
//! [cache]
//! max_entries = 256
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! PLANLAYER_OPTIMIZER__MAX_ITERATIONS=5
//! PLANLAYER_LOGGING__FORMAT=json
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Optimizer driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Upper bound on rule passes when no fixpoint is reached
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Rewrite `literal op column` predicates to `column op' literal`
    #[serde(default = "default_true")]
    pub enable_predicate_normalization: bool,

    /// Merge stacked range predicates into a single between predicate
    #[serde(default = "default_true")]
    pub enable_between_composition: bool,
}

/// Plan cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entries kept before least-recently-used eviction
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_true() -> bool {
    true
}
fn default_max_iterations() -> usize {
    10
}
fn default_max_entries() -> usize {
    1024
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. planlayer.toml (base configuration)
    /// 2. planlayer.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (PLANLAYER_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("planlayer.toml"))
            .merge(Toml::file("planlayer.local.toml"))
            .merge(Env::prefixed("PLANLAYER_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PLANLAYER_").split("__"))
            .extract()
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            max_iterations: default_max_iterations(),
            enable_predicate_normalization: true,
            enable_between_composition: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_entries: default_max_entries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
