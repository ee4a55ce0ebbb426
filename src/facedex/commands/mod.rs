//! # Command Layer
//!
//! This module contains the **core business logic** of facedex. Each command lives in its
//! own submodule and implements plain Rust functions over documents and indexes.
//!
//! ## Role and Responsibilities
//!
//! - Resolve filesystem paths onto tree nodes and flip their `like` flag ([`liking`])
//! - Slice and order collections of records for display ([`browse`])
//! - Pick the current source document for a session ([`sources`])
//! - Map image requests onto files ([`image`])
//! - Decode and index the current source ([`load`])
//!
//! ## What Commands Do NOT Do
//!
//! - **Locking**: callers hand in a `&mut Document` already taken from the cache
//! - **Persistence**: mutation results say whether to persist, the API enqueues
//! - **HTTP**: results carry an `http_status` hint and nothing more
//!
//! ## Testing Strategy
//!
//! Command tests operate on `serde_json::json!` documents directly, with no backend.

use crate::error::{FacedexError, Result};
use crate::model::Action;
use serde::{Deserialize, Serialize};

pub mod browse;
pub mod image;
pub mod liking;
pub mod load;
pub mod sources;

/// `paths` in a like request may be a single string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawLikeRequest {
    paths: Option<OneOrMany>,
    path: Option<String>,
    action: Option<String>,
}

/// A decoded like/unlike request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRequest {
    pub paths: Vec<String>,
    pub action: Action,
}

impl LikeRequest {
    pub fn new(paths: Vec<String>, action: Action) -> Self {
        Self { paths, action }
    }

    /// Accepts `{"paths": [..]}`, `{"paths": ".."}` or `{"path": ".."}` with an optional
    /// `action` (default `"like"`).
    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawLikeRequest = serde_json::from_str(body)
            .map_err(|e| FacedexError::MalformedRequest(format!("invalid JSON body: {}", e)))?;

        let mut paths = match raw.paths {
            Some(OneOrMany::One(path)) => vec![path],
            Some(OneOrMany::Many(paths)) => paths,
            None => Vec::new(),
        };
        if let Some(path) = raw.path {
            paths.push(path);
        }

        let action = raw
            .action
            .as_deref()
            .map(Action::parse_lenient)
            .unwrap_or(Action::Like);

        let request = Self { paths, action };
        request.validated()
    }

    /// Drops blank paths; fails if nothing is left.
    pub fn validated(mut self) -> Result<Self> {
        self.paths.retain(|p| !p.trim().is_empty());
        if self.paths.is_empty() {
            return Err(FacedexError::MalformedRequest(
                "no path supplied".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Per-path outcome of a like/unlike call. Partial success is a success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutationResult {
    pub action: Option<Action>,
    pub found: Vec<String>,
    pub not_found: Vec<String>,
}

impl MutationResult {
    pub fn new(action: Action) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        !self.found.is_empty()
    }

    pub fn http_status(&self) -> u16 {
        if self.is_success() {
            200
        } else {
            404
        }
    }
}
