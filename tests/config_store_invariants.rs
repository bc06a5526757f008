//! Config Store Invariant Tests
//!
//! - Invalid configs are rejected and leave the stored config unchanged
//! - Field names are unique
//! - A saved config reads back as saved, minus blank image placeholders
//! - Readers never observe a half-applied replacement

use std::sync::Arc;
use std::thread;

use abform::admin::AdminOrchestrator;
use abform::experiment::{
    ConfigStore, ExperimentConfig, ExperimentError, FieldDescriptor, FieldKind, ValidationError,
};
use abform::persistence::MemoryStateStore;

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_config() -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.fields = vec![
        FieldDescriptor::required_text("Name", "full_name"),
        FieldDescriptor::required_email("Email", "email"),
        FieldDescriptor::optional_text("Company", "company"),
    ];
    config
        .styles
        .insert("background_color".to_string(), "#ffffff".to_string());
    config.images = vec!["https://example.com/hero.png".to_string()];
    config.routing_probability = 0.4;
    config
}

// =============================================================================
// Probability Range
// =============================================================================

#[test]
fn test_out_of_range_probability_is_rejected() {
    let store = ConfigStore::new();
    store.replace_config(sample_config()).unwrap();

    for bad in [1.5, -0.1, f64::NAN] {
        let before = store.get_config();
        let version = store.version();

        let mut candidate = sample_config();
        candidate.routing_probability = bad;
        let err = store.replace_config(candidate).unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Validation(ValidationError::ProbabilityOutOfRange(_))
        ));

        assert_eq!(*store.get_config(), *before);
        assert_eq!(store.version(), version);
    }
}

#[test]
fn test_boundary_probabilities_are_accepted() {
    let store = ConfigStore::new();
    for p in [0.0, 1.0] {
        store.modify(|config| config.routing_probability = p).unwrap();
        assert_eq!(store.get_probability(), p);
    }
}

// =============================================================================
// Field Names and Kinds
// =============================================================================

#[test]
fn test_duplicate_field_names_are_rejected() {
    let store = ConfigStore::new();
    let mut candidate = sample_config();
    candidate.fields = vec![
        FieldDescriptor::required_email("Email", "email"),
        FieldDescriptor::required_email("Work email", "email"),
    ];

    let err = store.replace_config(candidate).unwrap_err();
    assert!(matches!(
        err,
        ExperimentError::Validation(ValidationError::DuplicateFieldName(ref name)) if name == "email"
    ));
    assert_eq!(store.version(), 0);
}

#[test]
fn test_unknown_field_kind_is_rejected_by_name() {
    let store = ConfigStore::new();
    let mut candidate = sample_config();
    candidate.fields.push(FieldDescriptor::new(
        FieldKind::Unknown("checkbox".to_string()),
        "Subscribe",
        "subscribe",
        false,
    ));

    let err = store.replace_config(candidate).unwrap_err();
    match err {
        ExperimentError::Validation(ValidationError::UnknownFieldKind { field, kind }) => {
            assert_eq!(field, "subscribe");
            assert_eq!(kind, "checkbox");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_empty_field_name_is_rejected() {
    let store = ConfigStore::new();
    let mut candidate = sample_config();
    candidate
        .fields
        .push(FieldDescriptor::optional_text("Nameless", "  "));

    let err = store.replace_config(candidate).unwrap_err();
    assert!(matches!(
        err,
        ExperimentError::Validation(ValidationError::EmptyFieldName { index: 3 })
    ));
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn test_round_trip_drops_only_blank_images() {
    let store = ConfigStore::new();
    let mut candidate = sample_config();
    candidate.images.insert(0, String::new());
    candidate.images.push("   ".to_string());

    store.replace_config(candidate.clone()).unwrap();

    let mut expected = candidate;
    expected.images = vec!["https://example.com/hero.png".to_string()];
    assert_eq!(*store.get_config(), expected);
}

#[test]
fn test_admin_working_copy_saves_atomically() {
    let store = Arc::new(ConfigStore::new());
    let admin = AdminOrchestrator::new(store.clone());

    let mut working = admin.working_copy();
    working.add_field(FieldDescriptor::required_text("Name", "full_name"));
    working.set_style("font_family", "Georgia, serif");
    let slot = working.add_image();
    assert!(working.set_image(slot, "https://example.com/b.png"));
    working.set_probability(0.2);

    // Nothing is visible until save.
    assert!(store.get_config().fields.is_empty());

    let version = admin.save(working).unwrap();
    let config = store.get_config();
    assert_eq!(version, 1);
    assert_eq!(config.fields.len(), 1);
    assert_eq!(config.style_or_default("font_family"), Some("Georgia, serif"));
    assert_eq!(config.images, vec!["https://example.com/b.png".to_string()]);
    assert_eq!(config.routing_probability, 0.2);
}

#[test]
fn test_failed_persist_leaves_config_unchanged() {
    let state = Arc::new(MemoryStateStore::new());
    let store = ConfigStore::with_state(state.clone()).unwrap();
    store.replace_config(sample_config()).unwrap();

    state.set_fail_writes(true);
    let mut candidate = sample_config();
    candidate.routing_probability = 0.9;
    let err = store.replace_config(candidate).unwrap_err();

    assert!(matches!(err, ExperimentError::Persistence(_)));
    assert_eq!(store.get_probability(), 0.4);
    assert_eq!(store.version(), 1);
}

// =============================================================================
// Concurrency
// =============================================================================

/// Two valid configs alternate; every read must equal one of them exactly.
#[test]
fn test_concurrent_readers_see_whole_snapshots() {
    let store = Arc::new(ConfigStore::new());

    let mut first = sample_config();
    first.routing_probability = 0.1;
    let mut second = sample_config();
    second.fields.truncate(1);
    second.images.clear();
    second.routing_probability = 0.9;
    store.replace_config(first.clone()).unwrap();

    let writers: Vec<_> = (0..2)
        .map(|w| {
            let store = store.clone();
            let (first, second) = (first.clone(), second.clone());
            thread::spawn(move || {
                for i in 0..200 {
                    let next = if (i + w) % 2 == 0 { &second } else { &first };
                    store.replace_config(next.clone()).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let (first, second) = (first.clone(), second.clone());
            thread::spawn(move || {
                let mut last_version = 0;
                for _ in 0..1_000 {
                    let snapshot = store.snapshot();
                    let config = &*snapshot.config;
                    assert!(config == &first || config == &second);
                    assert!(snapshot.version >= last_version);
                    last_version = snapshot.version;
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(store.version(), 401);
}
