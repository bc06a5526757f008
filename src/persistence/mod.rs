//! Persistence for experiment state
//!
//! - `StateStore`: the current config and the metrics counters
//! - `SubmissionLog`: accepted submissions, append-only
//!
//! Both come in a file-backed and an in-memory flavour. Failures are returned
//! to the caller as retryable errors and never corrupt in-memory state.

mod errors;
mod state;
mod submissions;

pub use errors::{PersistenceError, PersistenceResult};
pub use state::{
    FileStateStore, MemoryStateStore, PersistedConfig, StateStore, CONFIG_FILE_NAME,
    METRICS_FILE_NAME,
};
pub use submissions::{
    FileSubmissionLog, MemorySubmissionLog, SubmissionLog, SUBMISSIONS_FILE_NAME,
};
