//! # Mutation Resolver
//!
//! Maps filesystem paths coming from the browser back onto nodes of the nested `img`
//! tree and sets their `like` flag.
//!
//! For each requested path, every base root is tried in stored order. A base root
//! contains the path when the path's absolute form starts with the root's absolute form
//! at a directory boundary. The remainder is split into segments and walked one mapping
//! at a time; missing intermediate directories are created on the way. The last segment
//! must name an existing, non-empty node. If a containing root lacks the node, the next
//! root is tried; the first root that has it wins.
//!
//! `date_updated` is stamped once per call, and only when something was found.

use super::MutationResult;
use crate::error::Result;
use crate::model::{Action, Document, DATE_UPDATED_KEY, IMG_KEY, LIKE_KEY};
use crate::paths::{absolutize, relative_segments};
use chrono::{Local, SecondsFormat};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub fn like<S: AsRef<str>>(document: &mut Document, paths: &[S]) -> Result<MutationResult> {
    set_liked(document, paths, Action::Like)
}

pub fn unlike<S: AsRef<str>>(document: &mut Document, paths: &[S]) -> Result<MutationResult> {
    set_liked(document, paths, Action::Unlike)
}

pub fn set_liked<S: AsRef<str>>(
    document: &mut Document,
    paths: &[S],
    action: Action,
) -> Result<MutationResult> {
    let mut result = MutationResult::new(action);

    let base_roots = base_roots(document)?;
    for requested in paths {
        let requested = requested.as_ref();
        let target = absolutize(Path::new(requested))?;
        if mark(document, &base_roots, &target, action.liked()) {
            result.found.push(requested.to_string());
        } else {
            result.not_found.push(requested.to_string());
        }
    }

    if result.is_success() {
        if let Some(root) = document.as_object_mut() {
            root.insert(DATE_UPDATED_KEY.to_string(), Value::String(timestamp()));
        }
    }

    Ok(result)
}

/// Base root keys paired with their absolute forms, in stored order.
fn base_roots(document: &Document) -> Result<Vec<(String, PathBuf)>> {
    let Some(img) = document.get(IMG_KEY).and_then(Value::as_object) else {
        return Ok(Vec::new());
    };
    img.keys()
        .map(|base| Ok((base.clone(), absolutize(Path::new(base))?)))
        .collect()
}

fn mark(
    document: &mut Document,
    base_roots: &[(String, PathBuf)],
    target: &Path,
    liked: bool,
) -> bool {
    for (base, base_abs) in base_roots {
        let Some(segments) = relative_segments(base_abs, target) else {
            continue;
        };
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };
        let Some(tree) = document
            .get_mut(IMG_KEY)
            .and_then(|img| img.get_mut(base.as_str()))
            .and_then(Value::as_object_mut)
        else {
            continue;
        };

        let node = descend(tree, parents)
            .and_then(|dir| dir.get_mut(leaf.as_str()))
            .and_then(Value::as_object_mut)
            .filter(|node| !node.is_empty());
        if let Some(node) = node {
            node.insert(LIKE_KEY.to_string(), Value::Bool(liked));
            return true;
        }
    }
    false
}

/// Walks `parents` from `dir`, creating empty directories for missing segments.
/// Returns `None` if a segment exists but is not a mapping.
fn descend<'a>(
    mut dir: &'a mut Map<String, Value>,
    parents: &[String],
) -> Option<&'a mut Map<String, Value>> {
    for part in parents {
        dir = dir
            .entry(part.clone())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()?;
    }
    Some(dir)
}

fn timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
