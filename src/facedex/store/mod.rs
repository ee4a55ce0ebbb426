//! # Storage Layer
//!
//! Source documents live in JSON files on disk. The [`StorageBackend`] trait isolates the
//! raw read/write of one document so the rest of the crate can be tested without a
//! filesystem.
//!
//! ## Implementations
//!
//! - [`fs::FsBackend`]: Production backend. Reads UTF-8 JSON, writes it back
//!   pretty-printed with 4-space indentation and non-ASCII characters kept literal.
//!   Writes go to a temp file in the same directory and are renamed into place.
//! - [`memory::InMemoryBackend`]: Keeps serialized documents in a map. Used in tests,
//!   including failure injection for the persistence queue.
//!
//! ## Cache
//!
//! [`cache::DocumentCache`] sits on top of a backend and holds one decoded, transformed
//! document per source path. It is the only owner of mutable documents.
//!
//! ## File Format
//!
//! ```text
//! {
//!     "img": { "<base root>": { ...nested directories and leaves... } },
//!     "date_updated": "2024-03-01T10:00:00.000000+01:00",
//!     "...": "any other top-level fields, preserved"
//! }
//! ```

use crate::error::{FacedexError, Result};
use crate::model::Document;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::Path;

pub mod cache;
pub mod fs;
pub mod memory;

/// Raw document I/O.
///
/// Shared between request threads (loads) and the persistence consumer (saves), hence
/// the `Send + Sync` bound.
pub trait StorageBackend: Send + Sync + 'static {
    /// Read and decode the document stored at `source`.
    fn load_document(&self, source: &Path) -> Result<Document>;

    /// Overwrite the document stored at `source`.
    fn save_document(&self, source: &Path, document: &Document) -> Result<()>;
}

/// Serializes a document the way it is stored on disk.
pub fn to_disk_format(document: &Document) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| {
        FacedexError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}
