//! Experiment metrics
//!
//! - Counters only: visits and submissions per site
//! - Monotonic; saturate at `u64::MAX` instead of wrapping
//! - Atomic per counter, no lock; a snapshot is not consistent across counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::experiment::Variant;

/// Per-site visit and submission counters
#[derive(Debug, Default)]
pub struct ExperimentMetrics {
    site_a_visits: AtomicU64,
    site_b_visits: AtomicU64,
    site_a_submissions: AtomicU64,
    site_b_submissions: AtomicU64,
}

fn saturating_increment(counter: &AtomicU64) {
    // fetch_update only fails when the closure returns None.
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
        Some(v.saturating_add(1))
    });
}

impl ExperimentMetrics {
    /// All counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters resumed from a persisted snapshot
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        Self {
            site_a_visits: AtomicU64::new(snapshot.site_a_visits),
            site_b_visits: AtomicU64::new(snapshot.site_b_visits),
            site_a_submissions: AtomicU64::new(snapshot.site_a_submissions),
            site_b_submissions: AtomicU64::new(snapshot.site_b_submissions),
        }
    }

    fn visit_counter(&self, variant: Variant) -> &AtomicU64 {
        match variant {
            Variant::A => &self.site_a_visits,
            Variant::B => &self.site_b_visits,
        }
    }

    fn submission_counter(&self, variant: Variant) -> &AtomicU64 {
        match variant {
            Variant::A => &self.site_a_submissions,
            Variant::B => &self.site_b_submissions,
        }
    }

    pub fn record_visit(&self, variant: Variant) {
        saturating_increment(self.visit_counter(variant));
    }

    pub fn record_submission(&self, variant: Variant) {
        saturating_increment(self.submission_counter(variant));
    }

    pub fn visits(&self, variant: Variant) -> u64 {
        self.visit_counter(variant).load(Ordering::Relaxed)
    }

    pub fn submissions(&self, variant: Variant) -> u64 {
        self.submission_counter(variant).load(Ordering::Relaxed)
    }

    /// Point-in-time read of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            site_a_visits: self.visits(Variant::A),
            site_b_visits: self.visits(Variant::B),
            site_a_submissions: self.submissions(Variant::A),
            site_b_submissions: self.submissions(Variant::B),
        }
    }
}

/// Counter values as served by `/metrics` and persisted to disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub site_a_visits: u64,
    pub site_b_visits: u64,
    pub site_a_submissions: u64,
    pub site_b_submissions: u64,
}

impl MetricsSnapshot {
    pub fn visits(&self, variant: Variant) -> u64 {
        match variant {
            Variant::A => self.site_a_visits,
            Variant::B => self.site_b_visits,
        }
    }

    pub fn submissions(&self, variant: Variant) -> u64 {
        match variant {
            Variant::A => self.site_a_submissions,
            Variant::B => self.site_b_submissions,
        }
    }
}
