use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use compute_core::ReconcileMode;
use compute_engine::{ComputeSettings, EngineConfig, RunnerSettings};
use engine_logging::LogSettings;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_CONFIG_PATH: &str = "./compute_app.ron";

/// Backing store for computed results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum StoreKind {
    /// One JSON record per address under `data_dir`.
    #[default]
    File,
    /// Process-local; nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub clear_store_on_startup: bool,
    pub reconcile: ReconcileMode,
    pub poll_interval_ms: u64,
    pub compute_delay_ms: u64,
    pub scale_delay_by_index: bool,
    pub item_timeout_ms: Option<u64>,
    pub skip_cached: bool,
    pub log: LogSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./compute_cache"),
            store: StoreKind::File,
            clear_store_on_startup: true,
            reconcile: ReconcileMode::Push,
            poll_interval_ms: 250,
            compute_delay_ms: 2100,
            scale_delay_by_index: false,
            item_timeout_ms: None,
            skip_cached: true,
            log: LogSettings::default(),
        }
    }
}

/// Why the configuration file could not be used.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl AppConfig {
    /// Load the configuration at `path`; a missing file yields the defaults.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub(crate) fn sequence_path(&self) -> PathBuf {
        self.data_dir.join("sequence_numbers.ron")
    }

    pub(crate) fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            compute: ComputeSettings {
                delay: Duration::from_millis(self.compute_delay_ms),
                scale_by_index: self.scale_delay_by_index,
            },
            runner: RunnerSettings {
                item_timeout: self.item_timeout_ms.map(Duration::from_millis),
                skip_cached: self.skip_cached,
            },
            worker_threads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.ron");
        fs::write(
            &path,
            "(store: Memory, reconcile: Poll, compute_delay_ms: 10, item_timeout_ms: Some(500))",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.reconcile, ReconcileMode::Poll);
        assert_eq!(config.poll_interval_ms, 250);
        assert!(config.clear_store_on_startup);

        let engine = config.engine_config();
        assert_eq!(engine.compute.delay, Duration::from_millis(10));
        assert_eq!(engine.runner.item_timeout, Some(Duration::from_millis(500)));
        assert!(engine.runner.skip_cached);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.ron");
        fs::write(&path, "(store: Cloud)").unwrap();

        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn sequence_file_lives_in_data_dir() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/cache"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.sequence_path(),
            PathBuf::from("/tmp/cache/sequence_numbers.ron")
        );
    }
}
