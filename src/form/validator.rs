//! Submission validation against a field list
//!
//! Rules:
//! - every `required` field has a non-empty value after trimming
//! - non-empty `email` values have a local part, one "@" and a domain
//! - keys not declared by the field list are rejected
//!
//! All failures are collected; validation never stops at the first one.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::experiment::{FieldDescriptor, FieldError, FieldKind, ValidationError};

/// Submitted values keyed by field name
pub type FormValues = BTreeMap<String, String>;

/// Every configured field starts as an empty string
pub fn build_initial_values(fields: &[FieldDescriptor]) -> FormValues {
    fields
        .iter()
        .map(|field| (field.name.clone(), String::new()))
        .collect()
}

/// Basic email shape: `local@domain`, no whitespace, domain not empty
pub fn is_plausible_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !local.contains('@'),
        None => false,
    }
}

/// Decodes a submitted JSON body into form values.
///
/// The body must be an object of strings; every non-string value is reported
/// by field name.
pub fn values_from_json(body: Value) -> Result<FormValues, ValidationError> {
    let Value::Object(entries) = body else {
        return Err(ValidationError::MalformedBody {
            message: "expected a JSON object of field values".to_string(),
            fields: Vec::new(),
        });
    };

    let mut values = FormValues::new();
    let mut errors = Vec::new();
    for (name, value) in entries {
        match value {
            Value::String(s) => {
                values.insert(name, s);
            }
            _ => errors.push(FieldError::invalid_type(name)),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(ValidationError::Submission(errors))
    }
}

/// Checks `values` against `fields`
pub fn validate(values: &FormValues, fields: &[FieldDescriptor]) -> Result<(), Vec<FieldError>> {
    let declared: HashMap<&str, &FieldDescriptor> =
        fields.iter().map(|f| (f.name.as_str(), f)).collect();
    let mut errors = Vec::new();

    for field in fields {
        let value = values.get(&field.name).map(|v| v.trim()).unwrap_or("");

        if value.is_empty() {
            if field.required {
                errors.push(FieldError::required(&field.name));
            }
            continue;
        }

        if field.kind == FieldKind::Email && !is_plausible_email(value) {
            errors.push(FieldError::invalid_email(&field.name));
        }
    }

    for key in values.keys() {
        if !declared.contains_key(key.as_str()) {
            errors.push(FieldError::unknown_field(key));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
