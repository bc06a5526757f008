//! Form schema and renderer contract
//!
//! A renderer receives a `FormSchema`, starts every field from
//! `initial_values()`, and sends the values back for `validate` /
//! `to_submission`. The site A control form is the same contract with a fixed
//! field list.

mod diff;
mod schema;
mod submission;
mod validator;

pub use diff::VariantDiff;
pub use schema::{control_fields, FormSchema, CONTROL_FIELD_NAMES};
pub use submission::{to_submission, FormSubmission, SubmissionRecord};
pub use validator::{build_initial_values, is_plausible_email, validate, values_from_json, FormValues};
