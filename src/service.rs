//! Experiment service
//!
//! Composes the config store, router, metrics, admin orchestrator and
//! submission log into the operations the HTTP layer exposes. Every method is
//! synchronous and safe to call from many request tasks at once.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::admin::AdminOrchestrator;
use crate::experiment::{
    ConfigSnapshot, ConfigStore, ExperimentError, ExperimentResult, FieldErrorReason,
    RoutingDecision, ValidationError, Variant,
};
use crate::form::{FormSchema, FormValues, SubmissionRecord, VariantDiff};
use crate::observability::{Event, ExperimentMetrics, Logger, MetricsSnapshot, Severity};
use crate::persistence::{
    FileStateStore, FileSubmissionLog, MemorySubmissionLog, PersistenceResult, StateStore,
    SubmissionLog, SUBMISSIONS_FILE_NAME,
};
use crate::routing::{UnitSampler, VariantRouter};

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub site: Variant,
    /// Site B only: how the form differed from the control
    pub diff: Option<VariantDiff>,
}

pub struct ExperimentService {
    store: Arc<ConfigStore>,
    router: VariantRouter,
    admin: AdminOrchestrator,
    metrics: ExperimentMetrics,
    submissions: Arc<dyn SubmissionLog>,
    state: Option<Arc<dyn StateStore>>,
    sticky_routing: bool,
}

impl ExperimentService {
    /// Service with nothing persisted
    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(ConfigStore::new()),
            ExperimentMetrics::new(),
            Arc::new(MemorySubmissionLog::new()),
            None,
        )
    }

    /// Service backed by an arbitrary state store and submission log
    pub fn with_state(
        state: Arc<dyn StateStore>,
        submissions: Arc<dyn SubmissionLog>,
    ) -> ExperimentResult<Self> {
        let store = Arc::new(ConfigStore::with_state(state.clone())?);
        let metrics = match state.load_metrics()? {
            Some(snapshot) => ExperimentMetrics::from_snapshot(&snapshot),
            None => ExperimentMetrics::new(),
        };

        let service = Self::from_parts(store, metrics, submissions, Some(state));
        let snapshot = service.metrics();
        Logger::info(
            Event::StateRestored,
            &[
                ("config_version", service.store.version().to_string().as_str()),
                ("site_a_visits", snapshot.site_a_visits.to_string().as_str()),
                ("site_b_visits", snapshot.site_b_visits.to_string().as_str()),
            ],
        );
        Ok(service)
    }

    /// Service persisted as JSON files under `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> ExperimentResult<Self> {
        let state = FileStateStore::open(data_dir.as_ref())?;
        let submissions = FileSubmissionLog::open(state.data_dir().join(SUBMISSIONS_FILE_NAME))?;
        Self::with_state(Arc::new(state), Arc::new(submissions))
    }

    fn from_parts(
        store: Arc<ConfigStore>,
        metrics: ExperimentMetrics,
        submissions: Arc<dyn SubmissionLog>,
        state: Option<Arc<dyn StateStore>>,
    ) -> Self {
        Self {
            router: VariantRouter::new(store.clone()),
            admin: AdminOrchestrator::new(store.clone()),
            store,
            metrics,
            submissions,
            state,
            sticky_routing: false,
        }
    }

    /// Replace the random source used by `route`
    pub fn with_sampler(mut self, sampler: Box<dyn UnitSampler>) -> Self {
        self.router = VariantRouter::with_sampler(self.store.clone(), sampler);
        self
    }

    /// Honour visitor ids passed to `route`
    pub fn with_sticky_routing(mut self, enabled: bool) -> Self {
        self.sticky_routing = enabled;
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn admin(&self) -> &AdminOrchestrator {
        &self.admin
    }

    /// Route a visit and count it against the chosen site
    pub fn route(&self, visitor_id: Option<&str>) -> RoutingDecision {
        let decision = match visitor_id {
            Some(id) if self.sticky_routing && !id.is_empty() => self.router.route_visitor(id),
            _ => self.router.route(),
        };
        self.metrics.record_visit(decision.variant);
        decision
    }

    pub fn config(&self) -> ConfigSnapshot {
        self.store.snapshot()
    }

    pub fn form_schema(&self, variant: Variant) -> FormSchema {
        FormSchema::for_variant(variant, &self.store.snapshot())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Validate, log and count a submission.
    ///
    /// `rendered_version` is the config version a site B form was drawn
    /// from; a mismatch means the admin changed the form in between.
    pub fn submit(
        &self,
        variant: Variant,
        values: FormValues,
        rendered_version: Option<u64>,
    ) -> ExperimentResult<SubmissionReceipt> {
        let result = self.submit_inner(variant, values, rendered_version);
        match &result {
            Ok(receipt) => Logger::info(
                Event::SubmissionAccepted,
                &[
                    ("id", receipt.id.to_string().as_str()),
                    ("site", variant.as_str()),
                ],
            ),
            Err(e) if e.is_client_error() => Logger::warn(
                Event::SubmissionRejected,
                &[("error", e.to_string().as_str()), ("site", variant.as_str())],
            ),
            Err(e) => Logger::error(
                Event::PersistenceFailed,
                &[("error", e.to_string().as_str()), ("site", variant.as_str())],
            ),
        }
        result
    }

    fn submit_inner(
        &self,
        variant: Variant,
        values: FormValues,
        rendered_version: Option<u64>,
    ) -> ExperimentResult<SubmissionReceipt> {
        let snapshot = self.store.snapshot();

        if variant == Variant::B {
            if let Some(version) = rendered_version {
                if version != snapshot.version {
                    return Err(ExperimentError::ConfigChanged(format!(
                        "form was rendered from version {}, current version is {}",
                        version, snapshot.version
                    )));
                }
            }
        }

        let schema = FormSchema::for_variant(variant, &snapshot);
        let submission = schema
            .to_submission(values)
            .map_err(|e| classify_submission_error(variant, e))?;

        let mut record = SubmissionRecord::new(submission);
        let mut diff = None;
        if variant == Variant::B {
            let d = VariantDiff::between(&FormSchema::control(), &schema);
            record = record.with_config_version(snapshot.version).with_diff(d.clone());
            diff = Some(d);
        }

        self.submissions.append(&record)?;
        self.metrics.record_submission(variant);

        Ok(SubmissionReceipt {
            id: record.id,
            site: variant,
            diff,
        })
    }

    pub fn submissions(&self) -> ExperimentResult<Vec<SubmissionRecord>> {
        Ok(self.submissions.records()?)
    }

    /// Persist the current counters, if a state store is configured.
    ///
    /// Both outcomes are logged here, so periodic callers may drop the result.
    pub fn flush_metrics(&self) -> ExperimentResult<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        let snapshot = self.metrics.snapshot();
        let result = state.save_metrics(&snapshot);
        let (severity, event) = flush_outcome(&result);
        match &result {
            Ok(()) => Logger::log(
                severity,
                event,
                &[
                    ("site_a_submissions", snapshot.site_a_submissions.to_string().as_str()),
                    ("site_b_submissions", snapshot.site_b_submissions.to_string().as_str()),
                ],
            ),
            Err(e) => Logger::log(
                severity,
                event,
                &[("error", e.to_string().as_str()), ("target", "metrics")],
            ),
        }
        Ok(result?)
    }
}

fn flush_outcome(result: &PersistenceResult<()>) -> (Severity, Event) {
    match result {
        Ok(()) => (Severity::Info, Event::MetricsFlushed),
        Err(_) => (Severity::Error, Event::PersistenceFailed),
    }
}

/// Unknown keys on a site B form mean the schema moved under the visitor.
fn classify_submission_error(variant: Variant, err: ValidationError) -> ExperimentError {
    let unknown: Vec<&str> = err
        .field_errors()
        .iter()
        .filter(|e| e.reason == FieldErrorReason::UnknownField)
        .map(|e| e.field.as_str())
        .collect();

    if variant == Variant::B && !unknown.is_empty() {
        return ExperimentError::ConfigChanged(format!(
            "fields no longer in the form: {}",
            unknown.join(", ")
        ));
    }
    ExperimentError::Validation(err)
}
