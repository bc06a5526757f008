//! Routing Distribution Tests
//!
//! The observed share of site A visits must track the configured probability:
//! - p = 0 never routes to A
//! - p = 1 always routes to A
//! - intermediate p within ±1% at 100,000 draws
//! - probability changes take effect on the next call

use std::sync::Arc;

use abform::experiment::{ConfigStore, Variant};
use abform::routing::{simulate, visitor_unit, SeededSampler, VariantRouter};

const SAMPLES: u64 = 100_000;
const TOLERANCE: f64 = 0.01;

// =============================================================================
// Helper Functions
// =============================================================================

fn router_with_probability(p: f64, seed: u64) -> (Arc<ConfigStore>, VariantRouter) {
    let store = Arc::new(ConfigStore::new());
    store.modify(|config| config.routing_probability = p).unwrap();
    let router = VariantRouter::with_sampler(store.clone(), Box::new(SeededSampler::new(seed)));
    (store, router)
}

fn fraction_a(router: &VariantRouter, samples: u64) -> f64 {
    let a = (0..samples)
        .filter(|_| router.route().variant == Variant::A)
        .count();
    a as f64 / samples as f64
}

// =============================================================================
// Boundary Probabilities
// =============================================================================

#[test]
fn test_probability_zero_never_routes_to_a() {
    let (_store, router) = router_with_probability(0.0, 11);
    for _ in 0..10_000 {
        assert_eq!(router.route().variant, Variant::B);
    }
}

#[test]
fn test_probability_one_always_routes_to_a() {
    let (_store, router) = router_with_probability(1.0, 12);
    for _ in 0..10_000 {
        assert_eq!(router.route().variant, Variant::A);
    }
}

// =============================================================================
// Statistical Split
// =============================================================================

#[test]
fn test_observed_split_tracks_probability() {
    for (i, p) in [0.1, 0.25, 0.5, 0.75, 0.9].into_iter().enumerate() {
        let (_store, router) = router_with_probability(p, 100 + i as u64);
        let observed = fraction_a(&router, SAMPLES);
        assert!(
            (observed - p).abs() < TOLERANCE,
            "p = {}, observed = {}",
            p,
            observed
        );
    }
}

#[test]
fn test_simulate_report_matches_router() {
    let report = simulate(0.3, SAMPLES, &SeededSampler::new(42));
    assert_eq!(report.samples, SAMPLES);
    assert_eq!(report.site_a + report.site_b, SAMPLES);
    assert!((report.observed_a_fraction - 0.3).abs() < TOLERANCE);
}

/// An update applies to the very next visit.
#[test]
fn test_probability_update_applies_to_next_route() {
    let (store, router) = router_with_probability(1.0, 7);
    assert_eq!(router.route().variant, Variant::A);

    store.modify(|config| config.routing_probability = 0.0).unwrap();
    assert_eq!(router.route().variant, Variant::B);
}

// =============================================================================
// Sticky Visitors
// =============================================================================

#[test]
fn test_visitor_hash_is_stable_and_uniform() {
    assert_eq!(visitor_unit("visitor-1"), visitor_unit("visitor-1"));

    let n = 20_000;
    let below_half = (0..n)
        .filter(|i| visitor_unit(&format!("visitor-{}", i)) < 0.5)
        .count();
    let fraction = below_half as f64 / n as f64;
    assert!((fraction - 0.5).abs() < 0.02, "observed = {}", fraction);
}

#[test]
fn test_same_visitor_gets_same_site() {
    let (_store, router) = router_with_probability(0.5, 3);
    let first = router.route_visitor("returning-visitor").variant;
    for _ in 0..100 {
        assert_eq!(router.route_visitor("returning-visitor").variant, first);
    }
}
