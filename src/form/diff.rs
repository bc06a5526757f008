//! Differences between the control form and the experiment form
//!
//! Recorded with every site B submission so results can be grouped by what
//! the visitor actually saw.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::schema::FormSchema;

/// Field, style and image differences between two schemas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDiff {
    /// Field names present in exactly one of the two forms
    pub field_diff: Vec<String>,
    /// Style key -> (control value, experiment value), only where they differ
    pub style_diff: BTreeMap<String, (Option<String>, Option<String>)>,
    /// Image URLs present in exactly one of the two forms
    pub image_diff: Vec<String>,
}

impl VariantDiff {
    pub fn between(control: &FormSchema, experiment: &FormSchema) -> Self {
        let control_fields: BTreeSet<&str> = control.fields.iter().map(|f| f.name.as_str()).collect();
        let experiment_fields: BTreeSet<&str> =
            experiment.fields.iter().map(|f| f.name.as_str()).collect();
        let field_diff = control_fields
            .symmetric_difference(&experiment_fields)
            .map(|name| name.to_string())
            .collect();

        let keys: BTreeSet<&String> = control.styles.keys().chain(experiment.styles.keys()).collect();
        let style_diff = keys
            .into_iter()
            .filter_map(|key| {
                let a = control.styles.get(key);
                let b = experiment.styles.get(key);
                (a != b).then(|| (key.clone(), (a.cloned(), b.cloned())))
            })
            .collect();

        let control_images: BTreeSet<&str> = control.images.iter().map(String::as_str).collect();
        let experiment_images: BTreeSet<&str> = experiment.images.iter().map(String::as_str).collect();
        let image_diff = control_images
            .symmetric_difference(&experiment_images)
            .map(|url| url.to_string())
            .collect();

        Self {
            field_diff,
            style_diff,
            image_diff,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field_diff.is_empty() && self.style_diff.is_empty() && self.image_diff.is_empty()
    }
}
