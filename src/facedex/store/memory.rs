use super::{to_disk_format, StorageBackend};
use crate::error::{FacedexError, Result};
use crate::model::Document;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory storage for testing.
/// Documents are kept in their on-disk text form so format round-trips are exercised.
#[derive(Default)]
pub struct InMemoryBackend {
    files: Mutex<HashMap<PathBuf, String>>,
    fail_writes: AtomicBool,
    loads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, source: impl Into<PathBuf>, document: &Document) -> Self {
        self.insert(source, document);
        self
    }

    pub fn insert(&self, source: impl Into<PathBuf>, document: &Document) {
        let text = to_disk_format(document).unwrap_or_default();
        self.insert_raw(source, text);
    }

    pub fn insert_raw(&self, source: impl Into<PathBuf>, text: impl Into<String>) {
        self.lock().insert(source.into(), text.into());
    }

    pub fn remove(&self, source: &Path) {
        self.lock().remove(source);
    }

    /// Stored text for `source`, if any.
    pub fn contents(&self, source: &Path) -> Option<String> {
        self.lock().get(source).cloned()
    }

    /// Stored document for `source`, decoded.
    pub fn document(&self, source: &Path) -> Option<Document> {
        self.contents(source)
            .and_then(|text| serde_json::from_str(&text).ok())
    }

    /// Make every subsequent save fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, String>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageBackend for InMemoryBackend {
    fn load_document(&self, source: &Path) -> Result<Document> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let text = self.contents(source).ok_or_else(|| {
            FacedexError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such document: {}", source.display()),
            ))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save_document(&self, source: &Path, document: &Document) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FacedexError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "writes disabled",
            )));
        }
        let text = to_disk_format(document)?;
        self.lock().insert(source.to_path_buf(), text);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
