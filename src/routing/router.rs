//! Variant router
//!
//! `route()` draws r in [0, 1) and sends the visit to A when `r < p`, B
//! otherwise. `p` is read from the config store on every call, so a
//! probability change applies to the very next visit.

use std::sync::Arc;

use serde::Serialize;

use super::sampler::{visitor_unit, ThreadRngSampler, UnitSampler};
use crate::experiment::{ConfigStore, RoutingDecision, Variant};

/// The routing rule: A when `draw < probability`.
///
/// `probability = 0` never yields A, `probability = 1` always does.
pub fn decide(probability: f64, draw: f64) -> Variant {
    if draw < probability {
        Variant::A
    } else {
        Variant::B
    }
}

/// Routes visits using the live routing probability
pub struct VariantRouter {
    store: Arc<ConfigStore>,
    sampler: Box<dyn UnitSampler>,
}

impl VariantRouter {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self::with_sampler(store, Box::new(ThreadRngSampler))
    }

    pub fn with_sampler(store: Arc<ConfigStore>, sampler: Box<dyn UnitSampler>) -> Self {
        Self { store, sampler }
    }

    /// Stateless per-visit decision
    pub fn route(&self) -> RoutingDecision {
        let p = self.store.get_probability();
        RoutingDecision::new(decide(p, self.sampler.sample()))
    }

    /// Deterministic decision for a known visitor.
    ///
    /// The same visitor keeps the same variant until the probability moves
    /// across their hashed point.
    pub fn route_visitor(&self, visitor_id: &str) -> RoutingDecision {
        let p = self.store.get_probability();
        RoutingDecision::new(decide(p, visitor_unit(visitor_id)))
    }
}

/// Observed split of an offline routing run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitReport {
    pub probability: f64,
    pub samples: u64,
    pub site_a: u64,
    pub site_b: u64,
    pub observed_a_fraction: f64,
}

/// Runs the routing rule `samples` times against a fixed probability
pub fn simulate(probability: f64, samples: u64, sampler: &dyn UnitSampler) -> SplitReport {
    let site_a = (0..samples)
        .filter(|_| decide(probability, sampler.sample()) == Variant::A)
        .count() as u64;
    let observed_a_fraction = if samples == 0 {
        0.0
    } else {
        site_a as f64 / samples as f64
    };

    SplitReport {
        probability,
        samples,
        site_a,
        site_b: samples - site_a,
        observed_a_fraction,
    }
}
