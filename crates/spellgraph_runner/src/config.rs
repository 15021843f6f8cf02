// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner configuration.
//!
//! Stored as RON next to the effects being run (`spellgraph.ron` by default).

use crate::error::RunnerError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use spellgraph_graph::{EvaluatorConfig, StatType};
use std::path::Path;

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "spellgraph.ron";

/// Settings for one runner invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Format version
    pub version: u32,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Evaluator settings
    pub evaluator: EvaluatorConfig,
    /// Initial player stats
    pub player_stats: IndexMap<StatType, f32>,
    /// Initial target stats
    pub target_stats: IndexMap<StatType, f32>,
    /// Auto attacks simulated after the root run
    pub auto_attacks: u32,
    /// Subscribe event nodes before running
    pub subscribe_events: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            log_filter: "spellgraph_runner=info,spellgraph_graph=info".to_string(),
            evaluator: EvaluatorConfig::default(),
            player_stats: IndexMap::from([
                (StatType::Ad, 60.0),
                (StatType::Ap, 0.0),
                (StatType::Health, 600.0),
                (StatType::MaxHealth, 600.0),
                (StatType::Resource, 300.0),
                (StatType::MaxResource, 300.0),
            ]),
            target_stats: IndexMap::from([
                (StatType::Health, 1000.0),
                (StatType::MaxHealth, 1000.0),
                (StatType::Ar, 30.0),
                (StatType::Mr, 20.0),
            ]),
            auto_attacks: 0,
            subscribe_events: true,
        }
    }
}

impl RunnerConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunnerConfig = ron::from_str(&content).map_err(|source| RunnerError::Ron {
            path: path.to_path_buf(),
            source,
        })?;

        // Version check
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(RunnerError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        Ok(config)
    }

    /// Load a config file, or the defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, RunnerError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the config
    pub fn save(&self, path: &Path) -> Result<(), RunnerError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("spellgraph-{}.ron", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
        assert!(config.subscribe_events);
        assert_eq!(config.target_stats.get(&StatType::Health), Some(&1000.0));
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path();
        let mut config = RunnerConfig::default();
        config.auto_attacks = 3;
        config.evaluator.max_depth = 16;
        config.save(&path).unwrap();

        let loaded = RunnerConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RunnerConfig = ron::from_str("(auto_attacks: 2)").unwrap();
        assert_eq!(config.auto_attacks, 2);
        assert_eq!(config.evaluator, EvaluatorConfig::default());
    }

    #[test]
    fn test_newer_version_rejected() {
        let path = temp_path();
        std::fs::write(&path, "(version: 99)").unwrap();
        let result = RunnerConfig::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(RunnerError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = RunnerConfig::load_or_default(&temp_path()).unwrap();
        assert_eq!(config, RunnerConfig::default());
    }
}
