//! Observable events
//!
//! Every log line names one of these. Events are explicit and typed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    BootComplete,
    ServerListening,
    ShutdownStart,
    ShutdownComplete,

    // Startup state
    ConfigFileLoaded,
    StateRestored,

    // Admin
    ExperimentConfigSaved,
    ExperimentConfigRejected,
    RoutingProbabilityUpdated,

    // Visitors
    SubmissionAccepted,
    SubmissionRejected,

    // Persistence
    MetricsFlushed,
    PersistenceFailed,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::ServerListening => "SERVER_LISTENING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::ConfigFileLoaded => "CONFIG_FILE_LOADED",
            Event::StateRestored => "STATE_RESTORED",
            Event::ExperimentConfigSaved => "EXPERIMENT_CONFIG_SAVED",
            Event::ExperimentConfigRejected => "EXPERIMENT_CONFIG_REJECTED",
            Event::RoutingProbabilityUpdated => "ROUTING_PROBABILITY_UPDATED",
            Event::SubmissionAccepted => "SUBMISSION_ACCEPTED",
            Event::SubmissionRejected => "SUBMISSION_REJECTED",
            Event::MetricsFlushed => "METRICS_FLUSHED",
            Event::PersistenceFailed => "PERSISTENCE_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
