//! Flat artifact store.
//!
//! Every fetched file lands directly in the output directory under the
//! name the repository published it with; there is no Maven cache layout.

use std::path::{Path, PathBuf};

use mvn2get_util::errors::Mvn2getError;
use mvn2get_util::fs;

/// Persists verified downloads into a single flat directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.output_dir
    }

    /// Whether a file with this name already exists in the output directory.
    pub fn has(&self, filename: &str) -> bool {
        self.output_dir.join(filename).is_file()
    }

    /// Persist bytes under `filename`, atomically.
    ///
    /// Returns the written path, or `None` when the file already existed and
    /// `overwrite` is off. The directory is created on demand.
    pub fn write(
        &self,
        filename: &str,
        bytes: &[u8],
        overwrite: bool,
    ) -> miette::Result<Option<PathBuf>> {
        if !overwrite && self.has(filename) {
            return Ok(None);
        }
        let path = fs::write_atomic(&self.output_dir, filename, bytes).map_err(|e| {
            Mvn2getError::Store {
                message: format!("Failed to write {filename}: {e}"),
            }
        })?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_has() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        assert!(!store.has("lib-1.0.jar"));
        let path = store.write("lib-1.0.jar", b"bytes", false).unwrap();
        assert!(path.is_some());
        assert!(store.has("lib-1.0.jar"));
    }

    #[test]
    fn existing_file_is_kept_without_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.write("f.pom", b"original", false).unwrap();
        let second = store.write("f.pom", b"replacement", false).unwrap();
        assert!(second.is_none());
        assert_eq!(std::fs::read(tmp.path().join("f.pom")).unwrap(), b"original");
    }

    #[test]
    fn overwrite_replaces() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.write("f.pom", b"original", false).unwrap();
        store.write("f.pom", b"replacement", true).unwrap();
        assert_eq!(
            std::fs::read(tmp.path().join("f.pom")).unwrap(),
            b"replacement"
        );
    }

    #[test]
    fn creates_output_dir_on_demand() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("artifacts"));
        store.write("f.jar", b"x", false).unwrap();
        assert!(store.has("f.jar"));
    }
}
