//! Experiment record types
//!
//! - `Variant`: the two experiment arms
//! - `FieldKind` / `FieldDescriptor`: one input of the configurable form
//! - `ExperimentConfig`: fields, styles, images and routing probability

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default background color for both sites
pub const DEFAULT_BACKGROUND_COLOR: &str = "#f0f8ff";

/// Default font family for both sites
pub const DEFAULT_FONT_FAMILY: &str = "Arial, sans-serif";

/// Default routing probability (even split)
pub const DEFAULT_ROUTING_PROBABILITY: f64 = 0.5;

/// Style key for the form background
pub const STYLE_BACKGROUND_COLOR: &str = "background_color";

/// Style key for the form font
pub const STYLE_FONT_FAMILY: &str = "font_family";

/// Experiment arm.
///
/// A is the static control form, B is the configuration-driven form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
}

impl Variant {
    /// Returns the wire tag ("A" or "B")
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::A => "A",
            Variant::B => "B",
        }
    }

    /// Returns the site slug used in URLs ("site-a" or "site-b")
    pub fn site_slug(&self) -> &'static str {
        match self {
            Variant::A => "site-a",
            Variant::B => "site-b",
        }
    }

    /// Parses a site slug
    pub fn from_site_slug(slug: &str) -> Option<Self> {
        match slug {
            "site-a" => Some(Variant::A),
            "site-b" => Some(Variant::B),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input kind of a form field.
///
/// Unrecognised kinds survive deserialization as `Unknown` so that saving a
/// config can reject them with the offending field named.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    /// Single-line text input
    Text,
    /// Email input, shape-checked on submit
    Email,
    /// Multi-line text input
    Textarea,
    /// Anything else; never accepted by the store
    Unknown(String),
}

impl FieldKind {
    /// Returns the wire name of this kind
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Textarea => "textarea",
            FieldKind::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FieldKind::Unknown(_))
    }
}

impl From<String> for FieldKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "text" => FieldKind::Text,
            "email" => FieldKind::Email,
            "textarea" => FieldKind::Textarea,
            _ => FieldKind::Unknown(raw),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One input of the configurable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Input kind
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Submission payload key; unique per config
    pub name: String,

    /// Whether a non-empty value is mandatory
    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind, label: impl Into<String>, name: impl Into<String>, required: bool) -> Self {
        Self {
            kind,
            label: label.into(),
            name: name.into(),
            required,
        }
    }

    /// Create a required text field
    pub fn required_text(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(FieldKind::Text, label, name, true)
    }

    /// Create an optional text field
    pub fn optional_text(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(FieldKind::Text, label, name, false)
    }

    /// Create a required email field
    pub fn required_email(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(FieldKind::Email, label, name, true)
    }

    /// Create a required textarea field
    pub fn required_textarea(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(FieldKind::Textarea, label, name, true)
    }
}

/// Complete experiment configuration.
///
/// Stored as one immutable record; edits always produce a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Ordered form fields shown on site B
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,

    /// Style key -> value (e.g. background_color, font_family)
    #[serde(default)]
    pub styles: BTreeMap<String, String>,

    /// Ordered image URLs shown above the site B form
    #[serde(default)]
    pub images: Vec<String>,

    /// Probability of routing a visit to site A
    #[serde(default = "default_routing_probability")]
    pub routing_probability: f64,
}

fn default_routing_probability() -> f64 {
    DEFAULT_ROUTING_PROBABILITY
}

/// Styles both sites start with
pub fn default_styles() -> BTreeMap<String, String> {
    let mut styles = BTreeMap::new();
    styles.insert(STYLE_BACKGROUND_COLOR.to_string(), DEFAULT_BACKGROUND_COLOR.to_string());
    styles.insert(STYLE_FONT_FAMILY.to_string(), DEFAULT_FONT_FAMILY.to_string());
    styles
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            styles: default_styles(),
            images: Vec::new(),
            routing_probability: DEFAULT_ROUTING_PROBABILITY,
        }
    }
}

impl ExperimentConfig {
    /// Looks up a field by its submission key
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns a style value, falling back to the bootstrap default
    pub fn style_or_default(&self, key: &str) -> Option<&str> {
        match self.styles.get(key) {
            Some(value) => Some(value.as_str()),
            None => match key {
                STYLE_BACKGROUND_COLOR => Some(DEFAULT_BACKGROUND_COLOR),
                STYLE_FONT_FAMILY => Some(DEFAULT_FONT_FAMILY),
                _ => None,
            },
        }
    }

    /// Images with blank placeholders removed
    pub fn renderable_images(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }
}

/// Per-visit routing outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    #[serde(rename = "site")]
    pub variant: Variant,
}

impl RoutingDecision {
    pub fn new(variant: Variant) -> Self {
        Self { variant }
    }
}
