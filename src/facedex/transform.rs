//! # Path Transform Pipeline
//!
//! Documents are usually authored on one machine and browsed on another, so the absolute
//! base roots inside them rarely match. A pipeline of ordered `(old, new)` rules rewrites
//! the document on load and undoes the rewrite before it is written back.
//!
//! Substitution runs over the serialized JSON text, not over structured values. A rule
//! therefore also rewrites matching text in unrelated string fields (filenames, dates,
//! anything). This is existing behavior and is kept as is.
//!
//! Rules chain: in `apply` they run first to last, in `reverse` last to first with `new`
//! and `old` swapped, so `[a -> b, b -> c]` maps `a` to `c` and back.

use crate::error::{FacedexError, Result};
use crate::model::{Document, ReplaceRule};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacePipeline {
    rules: Vec<ReplaceRule>,
}

impl ReplacePipeline {
    pub fn new(rules: Vec<ReplaceRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ReplaceRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrites `old` to `new` for each rule in configured order.
    pub fn apply(&self, document: Document) -> Result<Document> {
        if self.rules.is_empty() {
            return Ok(document);
        }
        let pairs = self
            .rules
            .iter()
            .map(|r| (r.old.as_str(), r.new.as_str()));
        substitute(&document, pairs)
    }

    /// Rewrites `new` back to `old`, walking the rules backwards.
    pub fn reverse(&self, document: Document) -> Result<Document> {
        if self.rules.is_empty() {
            return Ok(document);
        }
        let pairs = self
            .rules
            .iter()
            .rev()
            .map(|r| (r.new.as_str(), r.old.as_str()));
        substitute(&document, pairs)
    }
}

fn substitute<'a>(
    document: &Document,
    pairs: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<Document> {
    let mut text = serde_json::to_string(document)?;
    for (from, to) in pairs {
        if from.is_empty() {
            continue;
        }
        text = text.replace(from, to);
    }
    serde_json::from_str(&text).map_err(|e| FacedexError::Transform(e.to_string()))
}
