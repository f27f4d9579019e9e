use std::fmt;

use serde::{Deserialize, Serialize};

/// Learning task a sample set was labeled for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// One class label per sample.
    #[display("classification")]
    Classification,
    /// A set of class labels per sample.
    #[display("multi-label classification")]
    MultiLabel,
    /// One class label per token.
    #[display("token classification")]
    TokenClassification,
    /// Continuous target.
    #[display("regression")]
    Regression,
}

/// Label of a single sample.
///
/// Single-label tasks use [`Label::Class`]; multi-label and token tasks carry
/// a tuple of class names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Class(String),
    Tuple(Vec<String>),
}

impl Label {
    /// Returns the class name of a single-label sample.
    #[must_use]
    pub fn as_class(&self) -> Option<&str> {
        match self {
            Label::Class(class) => Some(class),
            Label::Tuple(_) => None,
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Class(value.to_owned())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::Class(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Class(class) => write!(f, "{class}"),
            Label::Tuple(classes) => write!(f, "({})", classes.join(", ")),
        }
    }
}
