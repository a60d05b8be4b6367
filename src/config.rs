//! Host configuration.
//!
//! Priority, highest first:
//! 1. Command-line overrides
//! 2. Environment variables (`VOCAB_SRS_DB`, `VOCAB_SRS_LEARNER`)
//! 3. TOML configuration file
//! 4. Built-in defaults

use crate::models::MasteryStage;
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DB_ENV: &str = "VOCAB_SRS_DB";
pub const LEARNER_ENV: &str = "VOCAB_SRS_LEARNER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub learner_id: i64,
    /// Cap on the due list shown to a learner.
    pub due_limit: usize,
    pub challenging_limit: usize,
    /// Stages that are never due.
    pub exclude_stages: HashSet<MasteryStage>,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            learner_id: 1,
            due_limit: 20,
            challenging_limit: 10,
            exclude_stages: HashSet::from([MasteryStage::Solid]),
            log_filter: "info".to_string(),
        }
    }
}

/// Values supplied on the command line.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub learner_id: Option<i64>,
    pub due_limit: Option<usize>,
}

impl Config {
    /// Loads the TOML file (if any), then applies environment and CLI overrides.
    pub fn load(toml_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match toml_path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config = Self::from_toml(&text)?;
                info!(path = %path.display(), "loaded configuration");
                config
            }
            None => Self::default(),
        };

        if let Ok(db) = std::env::var(DB_ENV) {
            config.database_path = PathBuf::from(db);
        }
        if let Ok(learner) = std::env::var(LEARNER_ENV) {
            config.learner_id = learner.parse().map_err(|_| {
                ConfigError::Invalid(format!("{LEARNER_ENV}={learner} is not an integer"))
            })?;
        }

        if let Some(path) = overrides.database_path {
            config.database_path = path;
        }
        if let Some(learner_id) = overrides.learner_id {
            config.learner_id = learner_id;
        }
        if let Some(limit) = overrides.due_limit {
            config.due_limit = limit;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.due_limit == 0 {
            return Err(ConfigError::Invalid("due_limit must be at least 1".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path is empty".to_string()));
        }
        Ok(())
    }
}

fn default_database_path() -> PathBuf {
    ProjectDirs::from("", "", "vocab-srs")
        .map(|dirs| dirs.data_dir().join("vocab.sqlite3"))
        .unwrap_or_else(|| PathBuf::from("vocab.sqlite3"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.due_limit, 20);
        assert_eq!(config.challenging_limit, 10);
        assert!(config.exclude_stages.contains(&MasteryStage::Solid));
        assert_eq!(config.exclude_stages.len(), 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            database_path = "/tmp/words.sqlite3"
            due_limit = 50
            exclude_stages = ["solid", "liquid"]
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/words.sqlite3"));
        assert_eq!(config.due_limit, 50);
        assert_eq!(config.learner_id, 1);
        assert!(config.exclude_stages.contains(&MasteryStage::Liquid));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Config::from_toml("due_limit = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("exclude_stages = [\"mastered\"]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "learner_id = 7\ndue_limit = 5\n").unwrap();

        let config = Config::load(
            Some(&path),
            ConfigOverrides {
                database_path: Some(dir.path().join("cli.sqlite3")),
                due_limit: Some(12),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.due_limit, 12);
        assert_eq!(config.database_path, dir.path().join("cli.sqlite3"));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(
            Some(Path::new("/nonexistent/vocab.toml")),
            ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
