use super::{to_disk_format, StorageBackend};
use crate::error::{FacedexError, Result};
use crate::model::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Reads and writes documents directly at their source paths.
#[derive(Debug, Default, Clone)]
pub struct FsBackend;

impl FsBackend {
    pub fn new() -> Self {
        Self
    }

    fn tmp_path(source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        source.with_file_name(format!(".{}-{}.tmp", name, Uuid::new_v4()))
    }
}

impl StorageBackend for FsBackend {
    fn load_document(&self, source: &Path) -> Result<Document> {
        let content = fs::read_to_string(source).map_err(FacedexError::Io)?;
        let document: Document =
            serde_json::from_str(&content).map_err(FacedexError::Serialization)?;
        debug!(source = %source.display(), bytes = content.len(), "decoded document");
        Ok(document)
    }

    fn save_document(&self, source: &Path, document: &Document) -> Result<()> {
        let content = to_disk_format(document)?;

        // Atomic write
        let tmp_path = Self::tmp_path(source);
        if let Err(e) = fs::write(&tmp_path, &content) {
            let _ = fs::remove_file(&tmp_path);
            return Err(FacedexError::Io(e));
        }
        fs::rename(&tmp_path, source).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            FacedexError::Io(e)
        })?;

        debug!(source = %source.display(), bytes = content.len(), "wrote document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("faces.json");
        let backend = FsBackend::new();
        let doc = json!({"img": {"/data/a": {"x.jpg": {"face_scores": [0.9]}}}, "extra": "kept"});

        backend.save_document(&source, &doc).unwrap();
        assert_eq!(backend.load_document(&source).unwrap(), doc);
    }

    #[test]
    fn save_leaves_no_tmp_files() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("faces.json");
        FsBackend::new()
            .save_document(&source, &json!({"img": {}}))
            .unwrap();

        for entry in fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
    }

    #[test]
    fn written_file_is_indented_utf8() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("faces.json");
        FsBackend::new()
            .save_document(&source, &json!({"img": {"/相册": {}}}))
            .unwrap();

        let on_disk = fs::read_to_string(&source).unwrap();
        assert!(on_disk.starts_with("{\n    \"img\""));
        assert!(on_disk.contains("/相册"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FsBackend::new()
            .load_document(&dir.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, FacedexError::Io(_)));
    }

    #[test]
    fn corrupt_json_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("broken.json");
        fs::write(&source, "{\"img\": ").unwrap();
        let err = FsBackend::new().load_document(&source).unwrap_err();
        assert!(matches!(err, FacedexError::Serialization(_)));
    }
}
