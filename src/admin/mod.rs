//! Admin editing of the experiment config

mod orchestrator;

pub use orchestrator::{AdminOrchestrator, ConfigPatch, WorkingCopy};
