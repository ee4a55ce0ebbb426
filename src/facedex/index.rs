//! # Tree Indexer
//!
//! Source documents store detections as an arbitrarily deep tree mirroring the
//! filesystem:
//!
//! ```text
//! {
//!   "img": {
//!     "/data/people": {                      <- base root
//!       "a.jpg": {"face_scores": [0.9]},     <- leaf, category "people"
//!       "2019": {
//!         "trip": {
//!           "b.jpg": {"face_scores": []},    <- leaf with no faces, never indexed
//!           "c.jpg": {"face_scores": [0.7]}  <- leaf, category "2019/trip"
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Browsing needs two flat views of that tree:
//!
//! - [`CategoryIndex`]: category name to records, in pre-order walk order per base root.
//! - [`FileIndex`]: `"{category}/{filename}"` to the absolute file path, used to serve
//!   image bytes.
//!
//! ## Categories
//!
//! A record's category is the path of its parent directory relative to the base root,
//! always `/`-separated. Leaves sitting directly under a base root are filed under the
//! base root's last segment instead.
//!
//! ## Rebuild, Don't Maintain
//!
//! The index is rebuilt from the cached document on every load. It is never patched
//! incrementally, so a like is visible on the very next read and there is nothing to
//! invalidate.
//!
//! Two base roots can produce the same `category/filename` key. The later one in walk
//! order wins the [`FileIndex`] slot; both still appear in the [`CategoryIndex`].

use crate::error::Result;
use crate::model::{
    is_truthy, Document, ImageRecord, FACE_SCORES_KEY, IMG_KEY, LANDMARKS_KEY, LIKE_KEY,
};
use crate::paths::{absolutize, basename, normalize};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub type CategoryIndex = IndexMap<String, Vec<ImageRecord>>;
pub type FileIndex = IndexMap<String, PathBuf>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageIndex {
    pub categories: CategoryIndex,
    pub files: FileIndex,
}

impl ImageIndex {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category names in alphabetical order.
    pub fn sorted_categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Every record, categories in walk order.
    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.categories.values().flatten()
    }

    pub fn resolve_file(&self, category: &str, filename: &str) -> Option<&Path> {
        self.files
            .get(&file_key(category, filename))
            .map(PathBuf::as_path)
    }
}

pub fn file_key(category: &str, filename: &str) -> String {
    format!("{}/{}", category, filename)
}

/// Builds both indexes from a decoded document.
///
/// A missing or non-object `img` yields an empty index.
pub fn build_index(document: &Document) -> Result<ImageIndex> {
    let mut index = ImageIndex::default();
    let Some(img) = document.get(IMG_KEY).and_then(Value::as_object) else {
        return Ok(index);
    };

    for (base, tree) in img {
        let Some(tree) = tree.as_object() else {
            continue;
        };
        let base_abs = absolutize(Path::new(base))?;
        let root_category = basename(&base_abs);
        walk(tree, "", &base_abs, &root_category, &mut index);
    }

    Ok(index)
}

fn walk(
    node: &Map<String, Value>,
    rel_dir: &str,
    base_abs: &Path,
    root_category: &str,
    index: &mut ImageIndex,
) {
    for (key, value) in node {
        let Some(child) = value.as_object() else {
            continue;
        };

        match child.get(FACE_SCORES_KEY) {
            Some(scores) => {
                if !is_truthy(scores) {
                    continue;
                }
                let category = if rel_dir.is_empty() {
                    root_category.to_string()
                } else {
                    rel_dir.to_string()
                };
                let record = leaf_record(key, category, base_abs, rel_dir, child, scores);
                index
                    .files
                    .insert(file_key(&record.category, key), record.absolute_path.clone());
                index
                    .categories
                    .entry(record.category.clone())
                    .or_default()
                    .push(record);
            }
            None => {
                let nested = if rel_dir.is_empty() {
                    key.clone()
                } else {
                    format!("{}/{}", rel_dir, key)
                };
                walk(child, &nested, base_abs, root_category, index);
            }
        }
    }
}

fn leaf_record(
    filename: &str,
    category: String,
    base_abs: &Path,
    rel_dir: &str,
    node: &Map<String, Value>,
    scores: &Value,
) -> ImageRecord {
    let absolute_path = normalize(&base_abs.join(rel_dir).join(filename));
    let face_scores = scores
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    let landmark_scores = node
        .get(LANDMARKS_KEY)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let like = node.get(LIKE_KEY).is_some_and(is_truthy);

    ImageRecord {
        filename: filename.to_string(),
        category,
        absolute_path,
        face_scores,
        landmark_scores,
        like,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        json!({
            "img": {
                "/data/people": {
                    "a.jpg": {"face_scores": [0.9], "like": true},
                    "2019": {
                        "trip": {
                            "b.jpg": {"face_scores": []},
                            "c.jpg": {"face_scores": [0.7, 0.4], "face_landmark_scores_68": [[1, 2]]}
                        },
                        "d.jpg": {"face_scores": [0.5]}
                    }
                },
                "/data/pets": {
                    "e.jpg": {"face_scores": [0.2]}
                }
            },
            "date_updated": "2024-03-01T10:00:00+00:00"
        })
    }

    #[test]
    fn leaves_are_filed_under_parent_directory() {
        let index = build_index(&sample()).unwrap();
        let names: Vec<&str> = index.categories.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["people", "2019/trip", "2019", "pets"]);

        let trip = &index.categories["2019/trip"];
        assert_eq!(trip.len(), 1);
        assert_eq!(trip[0].filename, "c.jpg");
        assert_eq!(trip[0].face_scores, vec![0.7, 0.4]);
        assert_eq!(trip[0].landmark_scores, vec![json!([1, 2])]);
        assert_eq!(
            trip[0].absolute_path,
            PathBuf::from("/data/people/2019/trip/c.jpg")
        );
    }

    #[test]
    fn empty_face_scores_are_invisible() {
        let index = build_index(&sample()).unwrap();
        assert!(index.records().all(|r| r.filename != "b.jpg"));
        assert!(index.resolve_file("2019/trip", "b.jpg").is_none());
    }

    #[test]
    fn like_defaults_to_false() {
        let index = build_index(&sample()).unwrap();
        assert!(index.categories["people"][0].like);
        assert!(!index.categories["pets"][0].like);
    }

    #[test]
    fn file_index_resolves_absolute_paths() {
        let index = build_index(&sample()).unwrap();
        assert_eq!(
            index.resolve_file("people", "a.jpg"),
            Some(Path::new("/data/people/a.jpg"))
        );
        assert_eq!(index.files.len(), 4);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let doc = sample();
        let first = build_index(&doc).unwrap();
        let second = build_index(&doc).unwrap();
        assert_eq!(first, second);
        let order = |i: &ImageIndex| i.files.keys().cloned().collect::<Vec<_>>();
        assert_eq!(order(&first), order(&second));
    }

    #[test]
    fn colliding_keys_keep_the_later_path() {
        let doc = json!({"img": {
            "/one/shots": {"x.jpg": {"face_scores": [0.1]}},
            "/two/shots": {"x.jpg": {"face_scores": [0.2]}}
        }});
        let index = build_index(&doc).unwrap();
        assert_eq!(index.categories["shots"].len(), 2);
        assert_eq!(
            index.resolve_file("shots", "x.jpg"),
            Some(Path::new("/two/shots/x.jpg"))
        );
    }

    #[test]
    fn missing_img_yields_empty_index() {
        assert!(build_index(&json!({"date_updated": "x"})).unwrap().is_empty());
        assert!(build_index(&json!({"img": []})).unwrap().is_empty());
    }

    #[test]
    fn sorted_categories_are_alphabetical() {
        let index = build_index(&sample()).unwrap();
        assert_eq!(
            index.sorted_categories(),
            vec!["2019", "2019/trip", "people", "pets"]
        );
    }
}
