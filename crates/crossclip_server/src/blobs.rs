//! File-based blob storage for image clips.

use crate::error::{ServerError, ServerResult};
use crossclip_protocol::DEFAULT_IMAGE_EXTENSION;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 8;

/// Builds the stored name for an image blob: `<id>.<ext>`.
///
/// The extension is the last `.` segment of the uploaded filename, kept only
/// if it is short ASCII alphanumeric; otherwise `png` is used.
pub fn blob_file_name(id: &Uuid, original_filename: Option<&str>) -> String {
    let ext = original_filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string());

    format!("{id}.{ext}")
}

/// A directory of uploaded blobs, one file per image clip.
///
/// Blobs only live as long as the directory; nothing else is persisted.
#[derive(Debug)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Opens a blob store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: &Path) -> ServerResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Returns the directory holding the blobs.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes a blob.
    pub fn put(&self, name: &str, bytes: &[u8]) -> ServerResult<()> {
        let path = self
            .resolve(name)
            .ok_or_else(|| ServerError::BadRequest(format!("invalid blob name: {name}")))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Reads a blob.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the name is invalid or no such blob exists.
    pub fn read(&self, name: &str) -> ServerResult<Vec<u8>> {
        let path = self
            .resolve(name)
            .ok_or_else(|| ServerError::NotFound(format!("blob {name}")))?;
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ServerError::NotFound(format!("blob {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a blob. Returns `false` if it did not exist.
    pub fn delete(&self, name: &str) -> ServerResult<bool> {
        let Some(path) = self.resolve(name) else {
            return Ok(false);
        };
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns true if the blob exists.
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|path| path.is_file())
    }

    /// Maps a blob name to its path, rejecting anything that is not a plain file name.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0'])
            && !name.starts_with('.');
        valid.then(|| self.root.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_name_keeps_extension() {
        let id = Uuid::new_v4();
        assert_eq!(blob_file_name(&id, Some("shot.JPG")), format!("{id}.jpg"));
        assert_eq!(
            blob_file_name(&id, Some("archive.tar.gz")),
            format!("{id}.gz")
        );
    }

    #[test]
    fn file_name_defaults_to_png() {
        let id = Uuid::new_v4();
        assert_eq!(blob_file_name(&id, None), format!("{id}.png"));
        assert_eq!(blob_file_name(&id, Some("clipboard")), format!("{id}.png"));
        assert_eq!(blob_file_name(&id, Some("x.")), format!("{id}.png"));
        assert_eq!(blob_file_name(&id, Some("x./etc")), format!("{id}.png"));
        assert_eq!(
            blob_file_name(&id, Some("x.waytoolongext")),
            format!("{id}.png")
        );
    }

    #[test]
    fn put_read_delete() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();

        store.put("a.png", b"\x89PNG").unwrap();
        assert!(store.exists("a.png"));
        assert_eq!(store.read("a.png").unwrap(), b"\x89PNG");

        assert!(store.delete("a.png").unwrap());
        assert!(!store.exists("a.png"));
        assert!(!store.delete("a.png").unwrap());
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.read("nope.png"),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(&dir.path().join("blobs")).unwrap();
        fs::write(dir.path().join("secret.txt"), b"x").unwrap();

        assert!(matches!(
            store.read("../secret.txt"),
            Err(ServerError::NotFound(_))
        ));
        assert!(matches!(store.read(".."), Err(ServerError::NotFound(_))));
        assert!(store.put("../evil.png", b"x").is_err());
        assert!(!store.delete("../secret.txt").unwrap());
        assert!(dir.path().join("secret.txt").exists());
    }

    #[test]
    fn open_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = BlobStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.path(), nested.as_path());
    }
}
