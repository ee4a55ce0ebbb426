//! One decoded, transformed document per source path.
//!
//! Every read, index rebuild and mutation runs under the single cache lock. The lock is
//! only held across I/O when a document has to be decoded on a miss.
//!
//! A failed load is never cached: the next access retries, so a file that was locked or
//! not yet mounted heals itself without a restart.

use super::StorageBackend;
use crate::error::{FacedexError, Result};
use crate::model::Document;
use crate::transform::ReplacePipeline;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: Mutex<HashMap<PathBuf, Document>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` on the cached document for `source`, decoding it first if needed.
    ///
    /// Load failures come back as [`FacedexError::SourceUnavailable`].
    pub fn with_document<B, R, F>(
        &self,
        backend: &B,
        pipeline: &ReplacePipeline,
        source: &Path,
        f: F,
    ) -> Result<R>
    where
        B: StorageBackend + ?Sized,
        F: FnOnce(&mut Document) -> R,
    {
        let mut documents = self.lock();
        if !documents.contains_key(source) {
            let document = load_transformed(backend, pipeline, source).map_err(|e| {
                FacedexError::SourceUnavailable {
                    path: source.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
            documents.insert(source.to_path_buf(), document);
        }

        match documents.get_mut(source) {
            Some(document) => Ok(f(document)),
            None => Err(FacedexError::SourceUnavailable {
                path: source.to_path_buf(),
                reason: "document vanished from cache".to_string(),
            }),
        }
    }

    pub fn is_cached(&self, source: &Path) -> bool {
        self.lock().contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Document>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn load_transformed<B: StorageBackend + ?Sized>(
    backend: &B,
    pipeline: &ReplacePipeline,
    source: &Path,
) -> Result<Document> {
    let raw = backend.load_document(source)?;
    pipeline.apply(raw)
}
