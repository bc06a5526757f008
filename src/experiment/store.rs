//! Config store
//!
//! Holds the single current `ExperimentConfig` as an immutable snapshot.
//!
//! # Concurrency
//!
//! - Readers clone an `Arc` under a short read lock and never block on writers'
//!   validation or disk I/O.
//! - Writers are serialized by `writer`, held across validate, persist and
//!   publish. The `RwLock` write section only swaps the pointer.
//! - A failed replace (validation or persistence) leaves the published
//!   snapshot untouched.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::errors::{ExperimentError, ExperimentResult, ValidationError};
use super::types::ExperimentConfig;
use crate::persistence::{PersistedConfig, StateStore};

/// Point-in-time view of the store
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// 0 for the bootstrap config, +1 per successful replace
    pub version: u64,
    pub config: Arc<ExperimentConfig>,
}

/// Probabilities must lie in `[0, 1]`; NaN is rejected
pub fn validate_probability(p: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ValidationError::ProbabilityOutOfRange(p));
    }
    Ok(())
}

/// Validates a candidate config and returns the form that would be stored.
///
/// Checks probability range, field names (non-empty, unique) and field
/// kinds. Blank image placeholders are dropped.
pub fn validate_config(mut candidate: ExperimentConfig) -> Result<ExperimentConfig, ValidationError> {
    validate_probability(candidate.routing_probability)?;

    let mut seen = HashSet::with_capacity(candidate.fields.len());
    for (index, field) in candidate.fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            return Err(ValidationError::EmptyFieldName { index });
        }
        if !field.kind.is_known() {
            return Err(ValidationError::UnknownFieldKind {
                field: field.name.clone(),
                kind: field.kind.as_str().to_string(),
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(ValidationError::DuplicateFieldName(field.name.clone()));
        }
    }

    candidate.images.retain(|url| !url.trim().is_empty());

    Ok(candidate)
}

/// Owner of the live experiment config
pub struct ConfigStore {
    current: RwLock<ConfigSnapshot>,
    writer: Mutex<()>,
    state: Option<Arc<dyn StateStore>>,
}

impl ConfigStore {
    /// In-memory store seeded with the bootstrap defaults
    pub fn new() -> Self {
        Self::from_parts(0, ExperimentConfig::default(), None)
    }

    /// Store backed by `state`; loads the last saved config if there is one
    pub fn with_state(state: Arc<dyn StateStore>) -> ExperimentResult<Self> {
        let (version, config) = match state.load_config()? {
            Some(record) => (record.version, validate_config(record.config)?),
            None => (0, ExperimentConfig::default()),
        };
        Ok(Self::from_parts(version, config, Some(state)))
    }

    fn from_parts(version: u64, config: ExperimentConfig, state: Option<Arc<dyn StateStore>>) -> Self {
        Self {
            current: RwLock::new(ConfigSnapshot {
                version,
                config: Arc::new(config),
            }),
            writer: Mutex::new(()),
            state,
        }
    }

    /// Current config; callers get an immutable handle
    pub fn get_config(&self) -> Arc<ExperimentConfig> {
        self.snapshot().config
    }

    /// Current config together with its version
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Routing probability of the last published config
    pub fn get_probability(&self) -> f64 {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .routing_probability
    }

    pub fn version(&self) -> u64 {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Validate and atomically replace the whole config.
    ///
    /// Returns the new version.
    pub fn replace_config(&self, candidate: ExperimentConfig) -> ExperimentResult<u64> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.commit_locked(candidate)
    }

    /// Replace the config only if it is still at `expected_version`.
    ///
    /// A mismatch means another save landed after the caller read the
    /// config; nothing is written and `ConfigChanged` is returned.
    pub fn replace_if_current(
        &self,
        expected_version: u64,
        candidate: ExperimentConfig,
    ) -> ExperimentResult<u64> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.version();
        if current != expected_version {
            return Err(ExperimentError::ConfigChanged(format!(
                "edit started from version {}, current version is {}",
                expected_version, current
            )));
        }
        self.commit_locked(candidate)
    }

    /// Apply `edit` to a copy of the current config and replace it.
    ///
    /// The copy is taken under the writer lock, so concurrent `modify` calls
    /// never lose each other's edits.
    pub fn modify<F>(&self, edit: F) -> ExperimentResult<u64>
    where
        F: FnOnce(&mut ExperimentConfig),
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = (*self.get_config()).clone();
        edit(&mut candidate);
        self.commit_locked(candidate)
    }

    // Caller holds `writer`.
    fn commit_locked(&self, candidate: ExperimentConfig) -> ExperimentResult<u64> {
        let config = validate_config(candidate)?;
        let version = self.version() + 1;

        if let Some(state) = &self.state {
            state.save_config(&PersistedConfig {
                version,
                config: config.clone(),
            })?;
        }

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = ConfigSnapshot {
            version,
            config: Arc::new(config),
        };
        Ok(version)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
