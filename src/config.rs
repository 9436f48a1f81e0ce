//! # Configuration
//!
//! Hierarchical configuration loading from:
//! - `psystem.toml` (default configuration)
//! - `psystem.local.toml` (git-ignored local overrides)
//! - Environment variables (`PSYSTEM_` prefix)
//!
//! ## Example
//!
//! ```toml
//! # psystem.toml
//! semantics = "MAX_PARALLEL"
//! max_steps = 1000
//! seed = 42
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! PSYSTEM_SEMANTICS=MIN_PARALLEL
//! PSYSTEM_MAX_STEPS=500
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::derivation::Semantics;

/// Configuration consumed by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PSystemConfig {
    pub semantics: Semantics,

    /// `None` means unbounded (`max_steps ∈ ℕ ∪ {unbounded}`).
    #[serde(default)]
    pub max_steps: Option<u64>,

    /// `None` means an OS-entropy seed.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ambient logging configuration, independent of the trace-file data
/// artifact (`observers::FileTraceSink`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn`, `error`, or a `tracing`
    /// `EnvFilter` directive string.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"text"` or `"json"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

impl PSystemConfig {
    /// Merges, in order: `psystem.toml`, `psystem.local.toml`,
    /// `PSYSTEM_*` environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("psystem.toml"))
            .merge(Toml::file("psystem.local.toml"))
            .merge(Env::prefixed("PSYSTEM_"))
            .extract()
    }

    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::file(path)).merge(Env::prefixed("PSYSTEM_")).extract()
    }
}

impl Default for PSystemConfig {
    fn default() -> Self {
        PSystemConfig { semantics: Semantics::MaxParallel, max_steps: None, seed: None, logging: LoggingConfig::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_runs_unbounded_with_no_fixed_seed() {
        let config = PSystemConfig::default();
        assert_eq!(config.semantics, Semantics::MaxParallel);
        assert!(config.max_steps.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = PSystemConfig { semantics: Semantics::MinParallel, max_steps: Some(100), seed: Some(7), logging: LoggingConfig::default() };
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("semantics"));
        let parsed: PSystemConfig = Figment::new().merge(Toml::string(&toml_str)).extract().unwrap();
        assert_eq!(parsed.semantics, Semantics::MinParallel);
        assert_eq!(parsed.max_steps, Some(100));
        assert_eq!(parsed.seed, Some(7));
    }
}
