//! Core data types.
//!
//! A source document is kept as a dynamic [`serde_json::Value`]: only the `img` tree and
//! `date_updated` are interpreted, every other top-level field is carried through
//! untouched. Inside `img`, a node is a detection leaf if and only if it has a
//! `face_scores` key; any other object is a directory.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// The decoded form of one source file.
pub type Document = Value;

pub const IMG_KEY: &str = "img";
pub const DATE_UPDATED_KEY: &str = "date_updated";
pub const FACE_SCORES_KEY: &str = "face_scores";
pub const LANDMARKS_KEY: &str = "face_landmark_scores_68";
pub const LIKE_KEY: &str = "like";

/// One `(old, new)` substitution. Serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ReplaceRule {
    pub old: String,
    pub new: String,
}

impl ReplaceRule {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

impl From<(String, String)> for ReplaceRule {
    fn from((old, new): (String, String)) -> Self {
        Self { old, new }
    }
}

impl From<ReplaceRule> for (String, String) {
    fn from(rule: ReplaceRule) -> Self {
        (rule.old, rule.new)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Like,
    Unlike,
}

impl Action {
    /// Anything other than `"like"` is an unlike.
    pub fn parse_lenient(action: &str) -> Self {
        if action == "like" {
            Action::Like
        } else {
            Action::Unlike
        }
    }

    pub fn liked(self) -> bool {
        matches!(self, Action::Like)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Like => write!(f, "like"),
            Action::Unlike => write!(f, "unlike"),
        }
    }
}

/// A detection leaf flattened for browsing. Derived on every index build, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    pub filename: String,
    pub category: String,
    pub absolute_path: PathBuf,
    pub face_scores: Vec<f64>,
    pub landmark_scores: Vec<Value>,
    pub like: bool,
}

/// Per-browser state owned by the route layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub current_source: usize,
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
