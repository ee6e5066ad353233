//! Backup/replace policy for destination paths.
//!
//! Before anything is written over an existing path, the policy either
//! deletes what is there or renames it aside to `<path><extension>`. The
//! clear always completes before the write starts, so a write never lands on
//! top of old content that was supposed to be moved away.

use crate::Error;
use crate::Result;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;

/// Delete-or-rename policy applied to every path about to be overwritten.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use upack_core::ReplacePolicy;
///
/// let policy = ReplacePolicy::new(Some(".bak".to_string()));
/// // AndroidManifest.xml -> AndroidManifest.xml.bak, then write
/// policy.replace_file(Path::new("out/AndroidManifest.xml"), b"<manifest/>")?;
/// # Ok::<(), upack_core::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacePolicy {
    backup_extension: Option<String>,
}

impl ReplacePolicy {
    /// Creates a policy. An empty extension is the same as none.
    #[must_use]
    pub fn new(backup_extension: Option<String>) -> Self {
        Self {
            backup_extension: backup_extension.filter(|ext| !ext.is_empty()),
        }
    }

    /// Creates a policy that deletes displaced content.
    #[must_use]
    pub fn delete() -> Self {
        Self::default()
    }

    /// Returns the configured backup extension.
    #[must_use]
    pub fn backup_extension(&self) -> Option<&str> {
        self.backup_extension.as_deref()
    }

    /// Returns the backup location for `path` (`<path><extension>`).
    #[must_use]
    pub fn backup_path(&self, path: &Path) -> Option<PathBuf> {
        self.backup_extension.as_ref().map(|ext| {
            let mut name = OsString::from(path.as_os_str());
            name.push(ext);
            PathBuf::from(name)
        })
    }

    /// Makes `path` available for a fresh write.
    ///
    /// Without a backup extension anything at `path` is removed recursively.
    /// With one, a previous backup at `<path><extension>` is removed first
    /// (the last backup wins) and `path` is renamed onto it. Nothing at
    /// `path` is not an error. Returns the backup path when a rename
    /// happened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackupFailed`] with the offending path when a
    /// delete or rename fails.
    pub fn clear(&self, path: &Path) -> Result<Option<PathBuf>> {
        let Some(backup) = self.backup_path(path) else {
            discard(path)?;
            return Ok(None);
        };

        if !exists(path).map_err(|source| backup_failed(path, source))? {
            return Ok(None);
        }

        discard(&backup)?;
        std::fs::rename(path, &backup).map_err(|source| backup_failed(path, source))?;
        debug!(
            path = %path.display(),
            backup = %backup.display(),
            "moved existing content aside"
        );

        Ok(Some(backup))
    }

    /// Clears `path` and writes `contents` to it.
    ///
    /// Returns the backup path when the old file was renamed aside.
    ///
    /// # Errors
    ///
    /// [`Error::BackupFailed`] from the clear, [`Error::WriteFailed`] from
    /// the write.
    pub fn replace_file(&self, path: &Path, contents: &[u8]) -> Result<Option<PathBuf>> {
        let backup = self.clear(path)?;
        std::fs::write(path, contents).map_err(|source| Error::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote file");
        Ok(backup)
    }

    /// Clears `path` and creates it as a fresh, empty directory.
    ///
    /// Returns the backup path when the old content was renamed aside.
    ///
    /// # Errors
    ///
    /// [`Error::BackupFailed`] from the clear, [`Error::CreateDirFailed`]
    /// if the directory cannot be created.
    pub fn replace_dir(&self, path: &Path) -> Result<Option<PathBuf>> {
        let backup = self.clear(path)?;
        std::fs::create_dir_all(path).map_err(|source| Error::CreateDirFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(backup)
    }
}

/// Removes whatever exists at `path`, without backup.
///
/// Directories are removed recursively; symlinks are removed, not followed.
/// A missing path is not an error.
///
/// # Errors
///
/// Returns [`Error::BackupFailed`] if the removal fails.
pub fn discard(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(backup_failed(path, source)),
    };

    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.map_err(|source| backup_failed(path, source))?;

    debug!(path = %path.display(), "removed existing content");
    Ok(())
}

fn exists(path: &Path) -> std::io::Result<bool> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn backup_failed(path: &Path, source: std::io::Error) -> Error {
    Error::BackupFailed {
        path: path.to_path_buf(),
        source,
    }
}
