//! Durable experiment state
//!
//! Layout under the data directory:
//! - `experiment_config.json`: `{ "version": n, "config": ExperimentConfig }`
//! - `metrics.json`: MetricsSnapshot
//!
//! Files are replaced via write-to-temp + fsync + rename so a crash leaves
//! either the old or the new file, never a torn one.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::{PersistenceError, PersistenceResult};
use crate::experiment::ExperimentConfig;
use crate::observability::MetricsSnapshot;

pub const CONFIG_FILE_NAME: &str = "experiment_config.json";
pub const METRICS_FILE_NAME: &str = "metrics.json";

/// Config record as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedConfig {
    pub version: u64,
    pub config: ExperimentConfig,
}

/// Storage backend for config and metrics.
///
/// Implementations must make `save_*` all-or-nothing: after an error the
/// previously saved value is still what `load_*` returns.
pub trait StateStore: Send + Sync {
    fn load_config(&self) -> PersistenceResult<Option<PersistedConfig>>;

    fn save_config(&self, record: &PersistedConfig) -> PersistenceResult<()>;

    fn load_metrics(&self) -> PersistenceResult<Option<MetricsSnapshot>>;

    fn save_metrics(&self, snapshot: &MetricsSnapshot) -> PersistenceResult<()>;
}

/// JSON files in a data directory
pub struct FileStateStore {
    data_dir: PathBuf,
}

impl FileStateStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    pub fn open(data_dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| PersistenceError::io(&data_dir, e))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join(METRICS_FILE_NAME)
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> PersistenceResult<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
        let value = serde_json::from_str(&content)
            .map_err(|e| PersistenceError::corrupt(path, e.to_string()))?;
        Ok(Some(value))
    }

    fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> PersistenceResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp_path = path.with_extension("json.tmp");

        let mut file = File::create(&tmp_path).map_err(|e| PersistenceError::io(&tmp_path, e))?;
        file.write_all(&bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| PersistenceError::io(&tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, path).map_err(|e| PersistenceError::io(path, e))
    }
}

impl StateStore for FileStateStore {
    fn load_config(&self) -> PersistenceResult<Option<PersistedConfig>> {
        Self::read_json(&self.config_path())
    }

    fn save_config(&self, record: &PersistedConfig) -> PersistenceResult<()> {
        Self::write_json_atomic(&self.config_path(), record)
    }

    fn load_metrics(&self) -> PersistenceResult<Option<MetricsSnapshot>> {
        Self::read_json(&self.metrics_path())
    }

    fn save_metrics(&self, snapshot: &MetricsSnapshot) -> PersistenceResult<()> {
        Self::write_json_atomic(&self.metrics_path(), snapshot)
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    config: Mutex<Option<PersistedConfig>>,
    metrics: Mutex<Option<MetricsSnapshot>>,
    fail_writes: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail (simulates a full disk)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> PersistenceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::io(
                "<memory>",
                std::io::Error::new(std::io::ErrorKind::Other, "writes disabled"),
            ));
        }
        Ok(())
    }
}

impl StateStore for MemoryStateStore {
    fn load_config(&self) -> PersistenceResult<Option<PersistedConfig>> {
        Ok(self.config.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_config(&self, record: &PersistedConfig) -> PersistenceResult<()> {
        self.check_writable()?;
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        Ok(())
    }

    fn load_metrics(&self) -> PersistenceResult<Option<MetricsSnapshot>> {
        Ok(self.metrics.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_metrics(&self, snapshot: &MetricsSnapshot) -> PersistenceResult<()> {
        self.check_writable()?;
        *self.metrics.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(())
    }
}
