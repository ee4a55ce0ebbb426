//! Image lookup: `category` + `filename` from an image URL back to a file on disk.

use crate::index::ImageIndex;
use std::path::PathBuf;

/// Absolute path for the image, or `None` if the current index has no such entry.
///
/// When two base roots produce the same `category/filename`, the one walked last wins.
pub fn resolve_image_path(index: &ImageIndex, category: &str, filename: &str) -> Option<PathBuf> {
    index
        .resolve_file(category, filename)
        .map(|path| path.to_path_buf())
}
