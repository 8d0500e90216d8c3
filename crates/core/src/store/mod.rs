//! Directory-backed photo store.
//!
//! The store has no metadata of its own: it is the listing of one
//! directory, filtered by the image extension allow-list. Sizes and
//! timestamps are read from the filesystem every time they are asked for.

use chrono::{DateTime, Local, Utc};
use pf_protocol::photo_models::PhotoInfo;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Raster image extensions accepted anywhere in the system (lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Returns the lowercase extension of `filename` if it is on the allow-list.
///
/// The extension is whatever follows the last `.`; a name without a dot has
/// none.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Errors returned by store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The name is not a bare, allowed file name inside the store.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The name is valid but no such photo exists.
    #[error("Photo not found: {0}")]
    NotFound(String),

    #[error("File system error on {path}: {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One stored, normalized photograph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoEntry {
    /// On-disk file name, `<uuid>.<ext>`.
    pub identity: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Creation time, or modification time where creation is not reported.
    pub created_at: DateTime<Utc>,
}

impl PhotoEntry {
    /// Gallery view of this entry.
    pub fn to_info(&self) -> PhotoInfo {
        PhotoInfo {
            filename: self.identity.clone(),
            size: self.size_bytes,
            created: self
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        }
    }

    fn from_metadata(identity: String, path: PathBuf, metadata: &std::fs::Metadata) -> Option<Self> {
        if !metadata.is_file() {
            return None;
        }
        let created = metadata.created().or_else(|_| metadata.modified()).ok()?;
        Some(Self {
            identity,
            path,
            size_bytes: metadata.len(),
            created_at: DateTime::<Utc>::from(created),
        })
    }
}

/// A photo collection rooted at one directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the store directory if it does not exist.
    pub fn ensure_root(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root).map_err(|source| StoreError::FileSystem {
            path: self.root.clone(),
            source,
        })
    }

    /// List every photo, newest first.
    ///
    /// Entries that vanish or cannot be stat'ed mid-scan are skipped, and a
    /// missing store directory lists as empty.
    pub fn list(&self) -> Vec<PhotoEntry> {
        if !self.root.is_dir() {
            return Vec::new();
        }

        let mut photos: Vec<PhotoEntry> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!("Skipping unreadable store entry: {e}");
                    None
                }
            })
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                allowed_extension(&name)?;
                let metadata = entry.metadata().ok()?;
                PhotoEntry::from_metadata(name, entry.path().to_path_buf(), &metadata)
            })
            .collect();

        // Stable sort keeps equal timestamps in scan order.
        photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        photos
    }

    /// Map a bare identity to its path inside the store.
    ///
    /// Rejects anything that is not a single, allowed file name, before the
    /// filesystem is touched.
    pub fn resolve(&self, identity: &str) -> Result<PathBuf, StoreError> {
        validate_identity(identity)?;
        Ok(self.root.join(identity))
    }

    /// Read the entry for an identity.
    pub fn get(&self, identity: &str) -> Result<PhotoEntry, StoreError> {
        let path = self.resolve(identity)?;
        let metadata = std::fs::metadata(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(identity.to_string())
            } else {
                StoreError::FileSystem {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        PhotoEntry::from_metadata(identity.to_string(), path, &metadata)
            .ok_or_else(|| StoreError::NotFound(identity.to_string()))
    }

    /// Remove a photo.
    pub fn delete(&self, identity: &str) -> Result<(), StoreError> {
        let path = self.resolve(identity)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(identity, "Deleted photo");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(identity.to_string()))
            }
            Err(source) => Err(StoreError::FileSystem { path, source }),
        }
    }
}

/// Accept only a single normal path component with an allowed extension.
fn validate_identity(identity: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidTarget(identity.to_string());

    if identity.is_empty()
        || identity.contains(['/', '\\', '\0'])
        || identity.contains("..")
    {
        return Err(invalid());
    }

    let mut components = Path::new(identity).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => return Err(invalid()),
    }

    allowed_extension(identity).ok_or_else(invalid)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_allowed_extension_is_case_insensitive() {
        assert_eq!(allowed_extension("Holiday.JPG"), Some("jpg".to_string()));
        assert_eq!(allowed_extension("a.b.WebP"), Some("webp".to_string()));
        assert_eq!(allowed_extension("notes.txt"), None);
        assert_eq!(allowed_extension("jpg"), None);
        assert_eq!(allowed_extension("trailing."), None);
    }

    #[test]
    fn test_list_filters_by_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("b.PNG"), b"xy").unwrap();
        fs::write(dir.path().join("readme.txt"), b"no").unwrap();
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let store = PhotoStore::new(dir.path());
        let mut names: Vec<_> = store.list().into_iter().map(|e| e.identity).collect();
        names.sort();

        assert_eq!(names, vec!["a.jpg".to_string(), "b.PNG".to_string()]);
    }

    #[test]
    fn test_list_reports_size_from_filesystem() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.gif"), vec![0u8; 1234]).unwrap();

        let store = PhotoStore::new(dir.path());
        let photos = store.list();

        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].size_bytes, 1234);
        assert_eq!(photos[0].to_info().size, 1234);
        assert_eq!(photos[0].to_info().created.len(), "2024-01-01 00:00:00".len());
    }

    #[test]
    fn test_list_is_newest_first() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::new(dir.path());

        fs::write(dir.path().join("old.jpg"), b"1").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        fs::write(dir.path().join("new.jpg"), b"2").unwrap();

        let photos = store.list();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].identity, "new.jpg");
        assert!(photos[0].created_at >= photos[1].created_at);
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::new(dir.path().join("does-not-exist"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();

        let store = PhotoStore::new(dir.path());
        store.delete("a.jpg").unwrap();

        assert!(!dir.path().join("a.jpg").exists());
        assert!(matches!(store.delete("a.jpg"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_delete_rejects_traversal_regardless_of_extension() {
        let outer = tempdir().unwrap();
        let store_dir = outer.path().join("uploads");
        fs::create_dir(&store_dir).unwrap();
        fs::write(outer.path().join("victim.jpg"), b"keep me").unwrap();

        let store = PhotoStore::new(&store_dir);

        for name in [
            "../victim.jpg",
            "..\\victim.jpg",
            "sub/victim.jpg",
            "/etc/passwd.png",
            "..",
            "",
            "victim.txt",
            "..jpg",
        ] {
            assert!(
                matches!(store.delete(name), Err(StoreError::InvalidTarget(_))),
                "{name:?} should be rejected"
            );
        }

        assert!(outer.path().join("victim.jpg").exists());
    }

    #[test]
    fn test_resolve_keeps_bare_names_inside_root() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::new(dir.path());
        let path = store.resolve("0f8e.webp").unwrap();
        assert_eq!(path, dir.path().join("0f8e.webp"));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::new(dir.path());
        assert!(matches!(store.get("nope.jpg"), Err(StoreError::NotFound(_))));
    }
}
