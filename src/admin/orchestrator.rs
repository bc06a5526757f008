//! Admin orchestrator
//!
//! Operators edit a `WorkingCopy` through small pure operations. Nothing
//! touches the live store until `save`, which hands the assembled record to
//! `ConfigStore::replace_config`. Validation lives in the store only.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::experiment::{
    ConfigSnapshot, ConfigStore, ExperimentConfig, ExperimentError, ExperimentResult,
    FieldDescriptor,
};
use crate::observability::{Event, Logger};

/// Detached copy of the config being edited
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingCopy {
    config: ExperimentConfig,
    base_version: u64,
}

impl WorkingCopy {
    pub fn new(config: ExperimentConfig, base_version: u64) -> Self {
        Self {
            config,
            base_version,
        }
    }

    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
        Self::new((*snapshot.config).clone(), snapshot.version)
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Version of the store snapshot this copy was taken from
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn into_config(self) -> ExperimentConfig {
        self.config
    }

    pub fn add_field(&mut self, field: FieldDescriptor) {
        self.config.fields.push(field);
    }

    /// Removes the field at `index`; out-of-range is a no-op
    pub fn remove_field(&mut self, index: usize) -> Option<FieldDescriptor> {
        (index < self.config.fields.len()).then(|| self.config.fields.remove(index))
    }

    pub fn set_style(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.styles.insert(key.into(), value.into());
    }

    /// Appends an empty image slot and returns its index
    pub fn add_image(&mut self) -> usize {
        self.config.images.push(String::new());
        self.config.images.len() - 1
    }

    /// Sets the URL of an existing image slot; returns false if out of range
    pub fn set_image(&mut self, index: usize, url: impl Into<String>) -> bool {
        match self.config.images.get_mut(index) {
            Some(slot) => {
                *slot = url.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        (index < self.config.images.len()).then(|| self.config.images.remove(index))
    }

    pub fn set_probability(&mut self, probability: f64) {
        self.config.routing_probability = probability;
    }
}

/// Partial config as sent by the admin UI.
///
/// Missing keys keep their current value; unknown keys (`_id`, `version`)
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    #[serde(default)]
    pub fields: Option<Vec<FieldDescriptor>>,
    #[serde(default)]
    pub styles: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub routing_probability: Option<f64>,
}

impl ConfigPatch {
    pub fn apply_to(self, config: &mut ExperimentConfig) {
        if let Some(fields) = self.fields {
            config.fields = fields;
        }
        if let Some(styles) = self.styles {
            config.styles = styles;
        }
        if let Some(images) = self.images {
            config.images = images;
        }
        if let Some(p) = self.routing_probability {
            config.routing_probability = p;
        }
    }
}

/// Turns admin edits into atomic store replacements
pub struct AdminOrchestrator {
    store: Arc<ConfigStore>,
}

impl AdminOrchestrator {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Start an edit session from the live config
    pub fn working_copy(&self) -> WorkingCopy {
        WorkingCopy::from_snapshot(&self.store.snapshot())
    }

    /// Replace the live config with the working copy.
    ///
    /// Fails with `ConfigChanged` if another save landed after the copy was
    /// taken; the caller should start over from a fresh `working_copy()`.
    pub fn save(&self, working: WorkingCopy) -> ExperimentResult<u64> {
        let base_version = working.base_version();
        let result = self
            .store
            .replace_if_current(base_version, working.into_config());
        log_outcome(Event::ExperimentConfigSaved, &result);
        result
    }

    /// Merge a partial config into the live one and save
    pub fn save_patch(&self, patch: ConfigPatch) -> ExperimentResult<u64> {
        let result = self.store.modify(|config| patch.apply_to(config));
        log_outcome(Event::ExperimentConfigSaved, &result);
        result
    }

    /// Change only the routing probability; still fully validated
    pub fn update_probability(&self, probability: f64) -> ExperimentResult<u64> {
        let result = self
            .store
            .modify(|config| config.routing_probability = probability);
        log_outcome(Event::RoutingProbabilityUpdated, &result);
        result
    }
}

fn log_outcome(success: Event, result: &ExperimentResult<u64>) {
    match result {
        Ok(version) => Logger::info(success, &[("version", version.to_string().as_str())]),
        Err(e @ ExperimentError::Persistence(_)) => {
            Logger::error(Event::PersistenceFailed, &[("error", e.to_string().as_str())])
        }
        Err(e) => Logger::warn(
            Event::ExperimentConfigRejected,
            &[
                ("error", e.to_string().as_str()),
                ("fields", offending_fields(e).join(",").as_str()),
            ],
        ),
    }
}

fn offending_fields(err: &ExperimentError) -> Vec<String> {
    match err {
        ExperimentError::Validation(v) => v.offending_fields(),
        _ => Vec::new(),
    }
}
