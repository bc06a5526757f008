//! Experiment configuration core
//!
//! The config store owns the one live `ExperimentConfig`. Every edit builds a
//! brand-new record that is validated and then published atomically.

mod errors;
mod store;
mod types;

pub use errors::{
    ExperimentError, ExperimentResult, FieldError, FieldErrorReason, ValidationError,
};
pub use store::{validate_config, validate_probability, ConfigSnapshot, ConfigStore};
pub use types::{
    default_styles, ExperimentConfig, FieldDescriptor, FieldKind, RoutingDecision, Variant,
    DEFAULT_BACKGROUND_COLOR, DEFAULT_FONT_FAMILY, DEFAULT_ROUTING_PROBABILITY,
    STYLE_BACKGROUND_COLOR, STYLE_FONT_FAMILY,
};
