//! Single-writer archive lock.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{BibdexError, Result};

/// Exclusive write access to an archive, released on drop.
///
/// The lock is a file created with `create_new`, so a second writer fails
/// immediately instead of racing on shard files. A crashed writer leaves the
/// file behind; remove it by hand once no writer is running.
#[derive(Debug)]
pub struct ArchiveLock {
    path: PathBuf,
    _file: File,
}

impl ArchiveLock {
    /// Acquire the lock at `path`.
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    BibdexError::lock(format!(
                        "{} exists; another writer holds the archive",
                        path.display()
                    ))
                } else {
                    BibdexError::from(e)
                }
            })?;
        writeln!(file, "{}", std::process::id())?;
        log::debug!("acquired archive lock {}", path.display());

        Ok(ArchiveLock { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArchiveLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("cannot release archive lock {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_writer_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".bibdex.lock");

        let lock = ArchiveLock::acquire(&path).unwrap();
        let err = ArchiveLock::acquire(&path).unwrap_err();
        assert!(matches!(err, BibdexError::Lock(_)));
        assert!(err.is_fatal());

        drop(lock);
        assert!(!path.exists());
        assert!(ArchiveLock::acquire(&path).is_ok());
    }
}
