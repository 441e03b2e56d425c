use std::path::PathBuf;
use std::time::Duration;

use crate::error::{GriddleError, Result};

/// Knobs for the reindex poll loop inside a migration.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Number of times the migrator fetches the reindex task status before
    /// giving up on the migration.
    pub poll_attempts: usize,
    /// Time to wait between polls of the task endpoint.
    pub poll_interval: Duration,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 10,
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Configuration for the migration engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix used when building index and alias names, and to tell whether a
    /// particular index belongs to the application. Only indices carrying
    /// this prefix in their name *and* as the `_meta.type` of their mapping
    /// are considered managed.
    pub index_prefix: String,
    /// Directory of JSON files holding the versioned mapping for each
    /// document kind. The kind is the file name minus its extension.
    pub mappings_path: PathBuf,
    pub migration: MigrationConfig,
}

impl Config {
    pub fn new(index_prefix: impl Into<String>, mappings_path: impl Into<PathBuf>) -> Self {
        Self {
            index_prefix: index_prefix.into(),
            mappings_path: mappings_path.into(),
            migration: MigrationConfig::default(),
        }
    }

    /// Build a config from `GRIDDLE_*` environment variables.
    ///
    /// `GRIDDLE_INDEX_PREFIX` and `GRIDDLE_MAPPINGS_PATH` are required;
    /// `GRIDDLE_POLL_ATTEMPTS` and `GRIDDLE_POLL_INTERVAL_SECS` fall back to
    /// the defaults when unset.
    pub fn from_env() -> Result<Self> {
        let index_prefix = std::env::var("GRIDDLE_INDEX_PREFIX")
            .map_err(|_| GriddleError::Config("GRIDDLE_INDEX_PREFIX is not set".into()))?;
        let mappings_path = std::env::var("GRIDDLE_MAPPINGS_PATH")
            .map_err(|_| GriddleError::Config("GRIDDLE_MAPPINGS_PATH is not set".into()))?;

        let mut migration = MigrationConfig::default();
        if let Ok(attempts) = std::env::var("GRIDDLE_POLL_ATTEMPTS") {
            migration.poll_attempts = attempts.parse().map_err(|e| {
                GriddleError::Config(format!("invalid GRIDDLE_POLL_ATTEMPTS {:?}: {}", attempts, e))
            })?;
        }
        if let Ok(secs) = std::env::var("GRIDDLE_POLL_INTERVAL_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                GriddleError::Config(format!("invalid GRIDDLE_POLL_INTERVAL_SECS {:?}: {}", secs, e))
            })?;
            migration.poll_interval = Duration::from_secs(secs);
        }

        tracing::info!(
            "Loaded config from environment: index_prefix={}, mappings_path={}",
            index_prefix,
            mappings_path
        );

        Ok(Self {
            index_prefix,
            mappings_path: mappings_path.into(),
            migration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests that mutate global env vars must not run in parallel — they share
    // process-wide state. Serialize them with this mutex instead of adding a
    // new `serial_test` dev-dependency.
    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn clear_env() {
        std::env::remove_var("GRIDDLE_INDEX_PREFIX");
        std::env::remove_var("GRIDDLE_MAPPINGS_PATH");
        std::env::remove_var("GRIDDLE_POLL_ATTEMPTS");
        std::env::remove_var("GRIDDLE_POLL_INTERVAL_SECS");
    }

    #[test]
    fn test_migration_config_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.poll_attempts, 10);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_new_applies_migration_defaults() {
        let config = Config::new("griddle", "/etc/griddle/mappings");
        assert_eq!(config.index_prefix, "griddle");
        assert_eq!(config.mappings_path, PathBuf::from("/etc/griddle/mappings"));
        assert_eq!(config.migration.poll_attempts, 10);
    }

    #[test]
    fn test_from_env_requires_prefix() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("GRIDDLE_INDEX_PREFIX"));
    }

    #[test]
    fn test_from_env_requires_mappings_path() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("GRIDDLE_INDEX_PREFIX", "griddle");

        let err = Config::from_env().unwrap_err();
        clear_env();

        assert!(err.to_string().contains("GRIDDLE_MAPPINGS_PATH"));
    }

    #[test]
    fn test_from_env_full() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("GRIDDLE_INDEX_PREFIX", "myapp");
        std::env::set_var("GRIDDLE_MAPPINGS_PATH", "/srv/mappings");
        std::env::set_var("GRIDDLE_POLL_ATTEMPTS", "3");
        std::env::set_var("GRIDDLE_POLL_INTERVAL_SECS", "1");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.index_prefix, "myapp");
        assert_eq!(config.mappings_path, PathBuf::from("/srv/mappings"));
        assert_eq!(config.migration.poll_attempts, 3);
        assert_eq!(config.migration.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_from_env_defaults_for_migration_knobs() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("GRIDDLE_INDEX_PREFIX", "myapp");
        std::env::set_var("GRIDDLE_MAPPINGS_PATH", "/srv/mappings");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.migration.poll_attempts, 10);
        assert_eq!(config.migration.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_from_env_rejects_bad_poll_attempts() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("GRIDDLE_INDEX_PREFIX", "myapp");
        std::env::set_var("GRIDDLE_MAPPINGS_PATH", "/srv/mappings");
        std::env::set_var("GRIDDLE_POLL_ATTEMPTS", "lots");

        let err = Config::from_env().unwrap_err();
        clear_env();

        assert!(matches!(err, GriddleError::Config(_)));
        assert!(err.to_string().contains("GRIDDLE_POLL_ATTEMPTS"));
    }
}
