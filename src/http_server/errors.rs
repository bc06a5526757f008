//! Error bodies returned by the HTTP layer

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::experiment::{ExperimentError, FieldError, ValidationError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    /// Per-field details for rejected submissions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl From<ExperimentError> for ErrorResponse {
    fn from(err: ExperimentError) -> Self {
        Self {
            fields: err.field_errors().to_vec(),
            code: err.status_code(),
            error: err.to_string(),
        }
    }
}

impl ErrorResponse {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self {
            error: what.into(),
            code: 404,
            fields: Vec::new(),
        }
    }
}

/// Error half of every handler's result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(err: ExperimentError) -> ApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err)))
}

pub fn not_found(what: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::not_found(what)))
}

/// Undecodable request bodies are a 400 with the usual error shape
pub fn rejected_body(rejection: JsonRejection) -> ApiError {
    api_error(malformed_body(rejection.body_text()).into())
}

fn malformed_body(message: String) -> ValidationError {
    let fields = missing_field_name(&message)
        .map(|name| vec![FieldError::required(name)])
        .unwrap_or_default();
    ValidationError::MalformedBody { message, fields }
}

/// serde reports absent keys as "missing field `name`"
fn missing_field_name(message: &str) -> Option<&str> {
    let rest = message.split_once("missing field `")?.1;
    rest.split_once('`').map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ValidationError;

    #[test]
    fn test_submission_error_body_lists_fields() {
        let err = ExperimentError::from(ValidationError::Submission(vec![FieldError::required(
            "full_name",
        )]));
        let (status, Json(body)) = api_error(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], 400);
        assert_eq!(json["fields"][0]["field"], "full_name");
        assert_eq!(json["fields"][0]["reason"], "required");
    }

    #[test]
    fn test_config_changed_is_conflict() {
        let (status, Json(body)) = api_error(ExperimentError::ConfigChanged("x".into()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.fields.is_empty());
        assert!(body.error.starts_with("Configuration changed, please retry"));
    }

    #[test]
    fn test_missing_field_is_named() {
        let err = malformed_body(
            "Failed to deserialize the JSON body into the target type: fields[0]: missing field `name` at line 1 column 52"
                .to_string(),
        );
        assert_eq!(err.field_errors(), &[FieldError::required("name")]);

        let (status, Json(body)) = api_error(err.into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.fields[0].field, "name");
    }

    #[test]
    fn test_other_decode_errors_have_no_field() {
        assert_eq!(missing_field_name("expected value at line 1 column 1"), None);
        let err = malformed_body("expected value at line 1 column 1".to_string());
        assert!(err.field_errors().is_empty());
    }
}
