//! Submission payloads and the records kept for them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diff::VariantDiff;
use super::validator::FormValues;
use crate::experiment::Variant;

/// Validated values for one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub variant: Variant,
    pub values: FormValues,
}

impl FormSubmission {
    pub fn new(variant: Variant, values: FormValues) -> Self {
        Self { variant, values }
    }
}

/// Wraps values as a submission without validating them
pub fn to_submission(values: FormValues, variant: Variant) -> FormSubmission {
    FormSubmission::new(variant, values)
}

/// An accepted submission as stored in the submission log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    #[serde(rename = "site")]
    pub variant: Variant,
    pub values: FormValues,
    pub created_at: DateTime<Utc>,
    /// Config version a site B form was validated against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_version: Option<u64>,
    /// How site B differed from the control when this was submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<VariantDiff>,
}

impl SubmissionRecord {
    pub fn new(submission: FormSubmission) -> Self {
        Self {
            id: Uuid::new_v4(),
            variant: submission.variant,
            values: submission.values,
            created_at: Utc::now(),
            config_version: None,
            diff: None,
        }
    }

    pub fn with_config_version(mut self, version: u64) -> Self {
        self.config_version = Some(version);
        self
    }

    pub fn with_diff(mut self, diff: VariantDiff) -> Self {
        self.diff = Some(diff);
        self
    }
}
