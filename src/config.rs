//! Ambient configuration for the demo binary.
//!
//! The core library itself takes no configuration — `MatchingEngine` is
//! constructed directly from its collaborators. This module exists for the
//! binary that wires those collaborators together.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Symbols the demo seeds with an empty book at startup.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Price levels returned by a snapshot request (0 = unbounded).
    #[serde(default = "default_snapshot_depth")]
    pub snapshot_depth: usize,

    /// Passed to `tracing_subscriber::EnvFilter` if `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSD".to_string(), "ETHUSD".to_string()]
}

fn default_snapshot_depth() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Loads from `MATCHING_*` environment variables (a `.env` file is read
    /// first if present), falling back to defaults for anything unset.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        config::Config::builder()
            .add_source(config::Environment::with_prefix("MATCHING").separator("__"))
            .build()?
            .try_deserialize()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            snapshot_depth: default_snapshot_depth(),
            log_level: default_log_level(),
        }
    }
}
