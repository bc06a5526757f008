//! # Experiment Errors
//!
//! Error types for the config store, router and form contract.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::persistence::PersistenceError;

/// Result type for experiment operations
pub type ExperimentResult<T> = Result<T, ExperimentError>;

/// Why a single submitted value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorReason {
    /// Required field absent or blank after trimming
    Required,
    /// Email field without a local part, "@" and domain
    InvalidEmail,
    /// Key not declared by the schema
    UnknownField,
    /// Value is not a JSON string
    InvalidType,
}

impl FieldErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldErrorReason::Required => "required value is missing",
            FieldErrorReason::InvalidEmail => "value is not a valid email address",
            FieldErrorReason::UnknownField => "field is not part of the form",
            FieldErrorReason::InvalidType => "value must be a string",
        }
    }
}

/// A rejected submission value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: FieldErrorReason,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: FieldErrorReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, FieldErrorReason::Required)
    }

    pub fn invalid_email(field: impl Into<String>) -> Self {
        Self::new(field, FieldErrorReason::InvalidEmail)
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::new(field, FieldErrorReason::UnknownField)
    }

    pub fn invalid_type(field: impl Into<String>) -> Self {
        Self::new(field, FieldErrorReason::InvalidType)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.reason.as_str())
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rejected config or submission. Never mutates stored state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Routing probability must be between 0 and 1, got {0}")]
    ProbabilityOutOfRange(f64),

    #[error("Field at position {index} has an empty name")]
    EmptyFieldName { index: usize },

    #[error("Duplicate field name '{0}'")]
    DuplicateFieldName(String),

    #[error("Field '{field}' has unknown type '{kind}'")]
    UnknownFieldKind { field: String, kind: String },

    #[error("Submission rejected: {}", join_field_errors(.0))]
    Submission(Vec<FieldError>),

    /// Body could not be decoded into the expected shape
    #[error("Malformed request body: {message}")]
    MalformedBody {
        message: String,
        fields: Vec<FieldError>,
    },
}

impl ValidationError {
    /// Names of the fields this error is about
    pub fn offending_fields(&self) -> Vec<String> {
        match self {
            ValidationError::ProbabilityOutOfRange(_) => vec!["routing_probability".to_string()],
            ValidationError::EmptyFieldName { index } => vec![format!("fields[{}]", index)],
            ValidationError::DuplicateFieldName(name) => vec![name.clone()],
            ValidationError::UnknownFieldKind { field, .. } => vec![field.clone()],
            ValidationError::Submission(errors) | ValidationError::MalformedBody { fields: errors, .. } => {
                errors.iter().map(|e| e.field.clone()).collect()
            }
        }
    }

    /// Per-field details for submission errors
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ValidationError::Submission(errors) | ValidationError::MalformedBody { fields: errors, .. } => {
                errors
            }
            _ => &[],
        }
    }
}

/// Errors surfaced by the experiment core
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// Input rejected; state unchanged
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Submission was rendered from a schema that is no longer current
    #[error("Configuration changed, please retry: {0}")]
    ConfigChanged(String),

    /// State could not be written; retryable by the caller
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

impl ExperimentError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ExperimentError::Validation(_) => 400,
            ExperimentError::ConfigChanged(_) => 409,
            ExperimentError::Persistence(_) => 503,
        }
    }

    /// Returns whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ExperimentError::Validation(e) => e.field_errors(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let validation = ExperimentError::from(ValidationError::ProbabilityOutOfRange(1.5));
        assert_eq!(validation.status_code(), 400);
        assert!(validation.is_client_error());

        let changed = ExperimentError::ConfigChanged("field 'x' removed".into());
        assert_eq!(changed.status_code(), 409);
        assert!(changed.is_client_error());
    }

    #[test]
    fn test_submission_error_names_fields() {
        let err = ValidationError::Submission(vec![
            FieldError::required("full_name"),
            FieldError::invalid_email("email"),
        ]);
        assert_eq!(err.offending_fields(), vec!["full_name", "email"]);
        let message = err.to_string();
        assert!(message.contains("field 'full_name': required value is missing"));
        assert!(message.contains("field 'email'"));
    }

    #[test]
    fn test_config_error_messages() {
        let err = ValidationError::UnknownFieldKind {
            field: "agree".into(),
            kind: "checkbox".into(),
        };
        assert_eq!(err.to_string(), "Field 'agree' has unknown type 'checkbox'");
        assert_eq!(err.offending_fields(), vec!["agree"]);
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn test_malformed_body_keeps_field_details() {
        let err = ValidationError::MalformedBody {
            message: "missing field `name`".into(),
            fields: vec![FieldError::required("name")],
        };
        assert_eq!(err.offending_fields(), vec!["name"]);
        assert_eq!(err.field_errors()[0].reason, FieldErrorReason::Required);
        assert_eq!(ExperimentError::from(err).status_code(), 400);
    }
}
