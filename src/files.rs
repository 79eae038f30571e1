//! Byte persistence used by the PEM file helpers.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{CertError, Result};

/// Where generated material is read from and written to.
pub trait FileStore {
    fn exists(&self, path: &Path) -> bool;

    /// Writes `bytes` to `path`.
    ///
    /// Without `overwrite`, an existing path fails with
    /// [`CertError::PathExistsError`] and is left untouched.
    fn write(&self, bytes: &[u8], path: &Path, overwrite: bool) -> Result<()>;

    fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// [`FileStore`] over the local filesystem.
///
/// Writes are not atomic: a failure partway through may leave a partial file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileStore for LocalFiles {
    fn exists(&self, path: &Path) -> bool {
        !matches!(fs::metadata(path), Err(e) if e.kind() == ErrorKind::NotFound)
    }

    fn write(&self, bytes: &[u8], path: &Path, overwrite: bool) -> Result<()> {
        let mut file = if overwrite {
            File::create(path)?
        } else {
            // Existence check and open in one step.
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => CertError::PathExistsError(path.to_path_buf()),
                    _ => e.into(),
                })?
        };
        file.write_all(bytes)?;
        debug!(path = %path.display(), len = bytes.len(), "wrote file");
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_refuses_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.pem");
        let files = LocalFiles;

        assert!(!files.exists(&path));
        files.write(b"first", &path, false).unwrap();
        assert!(files.exists(&path));

        let err = files.write(b"second", &path, false).unwrap_err();
        assert!(matches!(err, CertError::PathExistsError(p) if p == path));
        assert_eq!(files.read(&path).unwrap(), b"first");
    }

    #[test]
    fn test_overwrite_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.pem");
        let files = LocalFiles;

        files.write(b"a longer first version", &path, false).unwrap();
        files.write(b"second", &path, true).unwrap();
        assert_eq!(files.read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFiles.read(&dir.path().join("missing.pem")).unwrap_err();
        assert!(matches!(err, CertError::IoError(_)));
    }
}
