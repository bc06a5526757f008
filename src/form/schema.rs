//! Renderable form schemas
//!
//! Site A renders a fixed control schema. Site B renders whatever the current
//! experiment config describes. Both go through the same validation and
//! submission path.

use std::collections::BTreeMap;

use serde::Serialize;

use super::submission::{to_submission, FormSubmission};
use super::validator::{build_initial_values, validate, FormValues};
use crate::experiment::{
    default_styles, ConfigSnapshot, ExperimentConfig, FieldDescriptor, ValidationError, Variant,
};

/// Field names of the control form
pub const CONTROL_FIELD_NAMES: [&str; 3] = ["full_name", "email", "message"];

/// Fields of the static site A form
pub fn control_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::required_text("Full Name", "full_name"),
        FieldDescriptor::required_email("Email", "email"),
        FieldDescriptor::required_textarea("Message", "message"),
    ]
}

/// Everything a renderer needs to draw one site's form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub site: Variant,
    /// Config version the schema was built from; `None` for the control
    pub version: Option<u64>,
    pub fields: Vec<FieldDescriptor>,
    pub styles: BTreeMap<String, String>,
    pub images: Vec<String>,
}

impl FormSchema {
    /// The fixed site A schema
    pub fn control() -> Self {
        Self {
            site: Variant::A,
            version: None,
            fields: control_fields(),
            styles: default_styles(),
            images: Vec::new(),
        }
    }

    /// The site B schema for a config snapshot
    pub fn experiment(snapshot: &ConfigSnapshot) -> Self {
        let mut schema = Self::from_config(&snapshot.config);
        schema.version = Some(snapshot.version);
        schema
    }

    /// The site B schema for a bare config
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            site: Variant::B,
            version: None,
            fields: config.fields.clone(),
            styles: config.styles.clone(),
            images: config.renderable_images().map(str::to_string).collect(),
        }
    }

    /// Schema for whichever site a visitor was routed to
    pub fn for_variant(variant: Variant, snapshot: &ConfigSnapshot) -> Self {
        match variant {
            Variant::A => Self::control(),
            Variant::B => Self::experiment(snapshot),
        }
    }

    pub fn initial_values(&self) -> FormValues {
        build_initial_values(&self.fields)
    }

    pub fn validate(&self, values: &FormValues) -> Result<(), ValidationError> {
        validate(values, &self.fields).map_err(ValidationError::Submission)
    }

    /// Validate and wrap the values as a submission for this site
    pub fn to_submission(&self, values: FormValues) -> Result<FormSubmission, ValidationError> {
        self.validate(&values)?;
        Ok(to_submission(values, self.site))
    }
}
