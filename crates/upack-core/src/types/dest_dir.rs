//! Extraction root with lexical containment checks.

use crate::Error;
use crate::Result;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// A cleaned, absolute destination directory for archive extraction.
///
/// Every archive entry is resolved against this root with
/// [`DestDir::resolve`], which rejects names that would land outside it.
/// The check is purely lexical: `..` segments are folded before comparing,
/// and the filesystem is never consulted, so it works for destinations that
/// do not exist yet.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use upack_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # #[cfg(unix)]
/// # {
/// let dest = DestDir::new("/tmp/plugin/./module")?;
/// assert_eq!(dest.as_path(), Path::new("/tmp/plugin/module"));
///
/// let inside = dest.resolve("libs/a.jar")?;
/// assert_eq!(inside, Path::new("/tmp/plugin/module/libs/a.jar"));
///
/// assert!(dest.resolve("../escape.txt").is_err());
/// # }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Creates a destination root from `path`.
    ///
    /// Relative paths are made absolute against the current directory, then
    /// the result is lexically cleaned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RelativePath`] if the path cannot be made absolute
    /// (empty path or unreadable current directory), and
    /// [`Error::PathTraversal`] if cleaning climbs above the filesystem root.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|_| Error::RelativePath {
            path: path.to_path_buf(),
        })?;
        let cleaned = lexical_clean(&absolute).ok_or_else(|| Error::PathTraversal {
            path: path.to_path_buf(),
        })?;
        Ok(Self(cleaned))
    }

    /// Returns the cleaned root.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolves an archive entry name to its destination path.
    ///
    /// The resolved path must have the root as a strict prefix: names that
    /// resolve to the root itself, climb out of it with `..`, or are
    /// absolute are all rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathTraversal`] carrying the entry name.
    pub fn resolve(&self, entry_name: &str) -> Result<PathBuf> {
        let traversal = || Error::PathTraversal {
            path: PathBuf::from(entry_name),
        };

        let joined = self.0.join(entry_name);
        let cleaned = lexical_clean(&joined).ok_or_else(traversal)?;

        if cleaned != self.0 && cleaned.starts_with(&self.0) {
            Ok(cleaned)
        } else {
            Err(traversal())
        }
    }

    /// Converts into the inner `PathBuf`.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for DestDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Folds `.` and `..` segments without touching the filesystem.
///
/// Returns `None` when a `..` would climb above the start of the path (the
/// root for absolute paths, the first segment for relative ones).
#[must_use]
pub fn lexical_clean(path: &Path) -> Option<PathBuf> {
    let mut anchor = PathBuf::new();
    let mut segments: Vec<&std::ffi::OsStr> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                anchor.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                segments.pop()?;
            }
            Component::Normal(name) => segments.push(name),
        }
    }

    let mut cleaned = anchor;
    cleaned.extend(segments);
    Some(cleaned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dest() -> (TempDir, DestDir) {
        let temp = TempDir::new().unwrap();
        let dest = DestDir::new(temp.path()).unwrap();
        (temp, dest)
    }

    #[test]
    fn test_lexical_clean_folds_segments() {
        assert_eq!(
            lexical_clean(Path::new("a/./b/../c")).unwrap(),
            PathBuf::from("a/c")
        );
        assert_eq!(lexical_clean(Path::new("a/..")).unwrap(), PathBuf::new());
        assert!(lexical_clean(Path::new("../a")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_lexical_clean_absolute() {
        assert_eq!(
            lexical_clean(Path::new("/x/y/../z")).unwrap(),
            PathBuf::from("/x/z")
        );
        assert!(lexical_clean(Path::new("/..")).is_none());
    }

    #[test]
    fn test_resolve_nested_entry() {
        let (_temp, dest) = dest();
        let resolved = dest.resolve("res/values/values.xml").unwrap();
        assert!(resolved.starts_with(dest.as_path()));
        assert!(resolved.ends_with("res/values/values.xml"));
    }

    #[test]
    fn test_resolve_directory_entry() {
        let (_temp, dest) = dest();
        let resolved = dest.resolve("res/").unwrap();
        assert!(resolved.ends_with("res"));
    }

    #[test]
    fn test_resolve_inner_parent_segments_stay_inside() {
        let (_temp, dest) = dest();
        let resolved = dest.resolve("a/../b.txt").unwrap();
        assert_eq!(resolved, dest.as_path().join("b.txt"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_temp, dest) = dest();
        for name in ["../evil", "a/../../evil", "./../evil", "a/b/../../../evil"] {
            let err = dest.resolve(name).unwrap_err();
            assert!(
                matches!(err, Error::PathTraversal { .. }),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_rejects_root_itself() {
        let (_temp, dest) = dest();
        assert!(dest.resolve(".").is_err());
        assert!(dest.resolve("a/..").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_absolute_names() {
        let (_temp, dest) = dest();
        assert!(dest.resolve("/etc/passwd").is_err());
    }

    #[test]
    fn test_resolve_rejects_sibling_with_shared_prefix() {
        let (temp, _) = dest();
        let dest = DestDir::new(temp.path().join("plugin")).unwrap();
        let err = dest.resolve("../plugin-evil/file").unwrap_err();
        assert!(err.is_security_violation());
    }

    #[test]
    fn test_new_makes_relative_absolute() {
        let dest = DestDir::new("relative/dir").unwrap();
        assert!(dest.as_path().is_absolute());
        assert!(dest.as_path().ends_with("relative/dir"));
    }
}
