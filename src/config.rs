//! Store configuration
//!
//! Points the toolkit at one SQLite database file and one directory of
//! per-table update logs. Every operation acquires its own connection from
//! these paths; nothing is opened or cached at construction time.

use std::path::PathBuf;

/// Configuration for a meter-reading store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,

    /// Directory holding the per-table update logs
    /// (`<log_dir>/<table>_updates.log`)
    pub log_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("meter.db"),
            log_dir: PathBuf::from("update_logs"),
        }
    }
}

impl StoreConfig {
    /// Create a configuration for the given database file, with the default
    /// log directory
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Default::default()
        }
    }

    /// Override the update-log directory
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    /// Load configuration from `METERDB_PATH` / `METERDB_LOG_DIR`, falling
    /// back to the defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: std::env::var("METERDB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_dir: std::env::var("METERDB_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = StoreConfig::default();
        assert_eq!(config.db_path, PathBuf::from("meter.db"));
        assert_eq!(config.log_dir, PathBuf::from("update_logs"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = StoreConfig::new("/data/readings.db").with_log_dir("/data/logs");
        assert_eq!(config.db_path, PathBuf::from("/data/readings.db"));
        assert_eq!(config.log_dir, PathBuf::from("/data/logs"));
    }
}
