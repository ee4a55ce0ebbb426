//! Decode-and-index for the session's current source.
//!
//! Load failures never reach the caller. The failure is logged and an empty index is
//! returned; since the cache never stores failed loads, the next request retries.

use crate::index::{build_index, ImageIndex};
use crate::store::cache::DocumentCache;
use crate::store::StorageBackend;
use crate::transform::ReplacePipeline;
use std::path::Path;
use tracing::{debug, error};

pub fn run<B: StorageBackend + ?Sized>(
    cache: &DocumentCache,
    backend: &B,
    pipeline: &ReplacePipeline,
    source: &Path,
) -> ImageIndex {
    let result = cache
        .with_document(backend, pipeline, source, |document| build_index(document))
        .and_then(|index| index);

    match result {
        Ok(index) => {
            debug!(
                source = %source.display(),
                categories = index.categories.len(),
                files = index.files.len(),
                "indexed source"
            );
            index
        }
        Err(e) => {
            error!(source = %source.display(), error = %e, "failed to load source");
            ImageIndex::default()
        }
    }
}
