//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - config.toml (default configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (`ENTROPY_MINER_*` prefix)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! [engine]
//! kind = "tid-cnt"
//! reorder_columns = true
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! ENTROPY_MINER_ENGINE__KIND=buc
//! ENTROPY_MINER_LOGGING__LEVEL=debug
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::engines::{BucVariant, EngineKind};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which engine to run and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_kind")]
    pub kind: EngineChoice,

    /// Only consulted when `kind = "buc"`.
    #[serde(default)]
    pub buc_variant: BucVariantChoice,

    /// Whether to run the most-distinct-first column reorderer before the
    /// engine. Purely a performance knob, finalized entropies are
    /// identical either way.
    #[serde(default = "default_true")]
    pub reorder_columns: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            kind: default_engine_kind(),
            buc_variant: BucVariantChoice::default(),
            reorder_columns: true,
        }
    }
}

/// Serde-friendly mirror of [`EngineKind`] minus the BUC variant, which is
/// configured separately so `buc_variant` stays meaningful even while
/// `kind = "tid-cnt"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineChoice {
    TidCnt,
    Buc,
}

fn default_engine_kind() -> EngineChoice {
    EngineChoice::TidCnt
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucVariantChoice {
    #[default]
    Filter,
    Materialize,
}

impl EngineConfig {
    /// Resolve into the [`EngineKind`] the engines module expects.
    pub fn resolve(&self) -> EngineKind {
        match self.kind {
            EngineChoice::TidCnt => EngineKind::TidCnt,
            EngineChoice::Buc => EngineKind::Buc(match self.buc_variant {
                BucVariantChoice::Filter => BucVariant::Filter,
                BucVariantChoice::Materialize => BucVariant::Materialize,
            }),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Merges in order:
    /// 1. `config.toml` (base configuration)
    /// 2. `config.local.toml` (local overrides, git-ignored)
    /// 3. Environment variables (`ENTROPY_MINER_*` prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("ENTROPY_MINER_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ENTROPY_MINER_").split("__"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config { engine: EngineConfig::default(), logging: LoggingConfig::default() }
    }
}
