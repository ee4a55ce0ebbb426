//! Lexical path helpers.
//!
//! Base roots and requested image paths are plain strings taken from JSON documents and
//! HTTP payloads. None of them are guaranteed to exist on this machine, so everything here
//! is purely lexical: no symlink resolution, no `canonicalize`.

use crate::error::Result;
use std::path::{Component, Path, PathBuf};

/// Collapses `.` and `..` components without touching the filesystem.
///
/// `..` at the root of an absolute path is dropped; on a relative path it is kept.
/// An empty result becomes `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Joins relative paths onto the current directory, then normalizes.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir()?;
    Ok(normalize(&cwd.join(path)))
}

/// Path segments leading from `base` to `target`, if `target` lies under `base`.
///
/// Containment is component-wise, so `/data/ab` is not under `/data/a`.
/// Both paths are expected to be normalized already.
pub fn relative_segments(base: &Path, target: &Path) -> Option<Vec<String>> {
    let rest = target.strip_prefix(base).ok()?;
    Some(
        rest.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect(),
    )
}

/// Last path segment, or an empty string for a bare root.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("/data/./a/../b/x.jpg")),
            PathBuf::from("/data/b/x.jpg")
        );
        assert_eq!(normalize(Path::new("a/b/..")), PathBuf::from("a"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn normalize_keeps_leading_parent_on_relative_paths() {
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn absolutize_relative_paths_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new("photos")).unwrap(), cwd.join("photos"));
        assert_eq!(
            absolutize(Path::new("/tmp/../srv")).unwrap(),
            PathBuf::from("/srv")
        );
    }

    #[test]
    fn relative_segments_respects_directory_boundaries() {
        let base = Path::new("/data/a");
        assert_eq!(
            relative_segments(base, Path::new("/data/a/sub/x.jpg")),
            Some(vec!["sub".to_string(), "x.jpg".to_string()])
        );
        assert_eq!(relative_segments(base, Path::new("/data/ab/x.jpg")), None);
        assert_eq!(relative_segments(base, Path::new("/data/a")), Some(vec![]));
    }

    #[test]
    fn basename_of_root_is_empty() {
        assert_eq!(basename(Path::new("/data/people")), "people");
        assert_eq!(basename(Path::new("/")), "");
    }
}
