//! Directory tree walking for archive rebuilds.
//!
//! The walker only visits; it knows nothing about archives or predicates.
//! [`crate::creation::zip`] consumes it to write entries.

use crate::Error;
use crate::Result;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Walks every file and directory below a root.
///
/// Entries come in walkdir's natural directory-listing order, which is
/// stable for an unchanged tree. The root itself is not yielded. Symlinks
/// are followed so linked files are archived by content.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use upack_core::creation::TreeWalker;
///
/// for entry in TreeWalker::new(Path::new("./scratch")).walk() {
///     let entry = entry?;
///     println!("{} (dir: {})", entry.relative, entry.is_dir);
/// }
/// # Ok::<(), upack_core::Error>(())
/// ```
pub struct TreeWalker<'a> {
    root: &'a Path,
}

impl<'a> TreeWalker<'a> {
    /// Creates a walker for `root`.
    #[must_use]
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Returns an iterator over the entries below the root.
    ///
    /// # Errors
    ///
    /// Items are [`Error::SourceReadFailed`] when the root itself cannot be
    /// read and [`Error::EntryReadFailed`] for anything deeper.
    pub fn walk(&self) -> impl Iterator<Item = Result<WalkEntry>> + '_ {
        WalkDir::new(self.root)
            .min_depth(1)
            .follow_links(true)
            .into_iter()
            .map(move |entry| {
                let entry = entry.map_err(|e| self.walk_error(e))?;
                let path = entry.path().to_path_buf();
                let relative = relative_name(self.root, &path);
                Ok(WalkEntry {
                    is_dir: entry.file_type().is_dir(),
                    path,
                    relative,
                })
            })
    }

    fn walk_error(&self, err: walkdir::Error) -> Error {
        let at_root = err.depth() == 0;
        let path = err
            .path()
            .map_or_else(|| self.root.to_path_buf(), Path::to_path_buf);
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));

        if at_root {
            Error::SourceReadFailed {
                path: self.root.to_path_buf(),
                source,
            }
        } else {
            Error::EntryReadFailed { path, source }
        }
    }
}

/// One visited entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Full filesystem path.
    pub path: PathBuf,

    /// Path relative to the walk root, joined with `/`.
    pub relative: String,

    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Joins the components of `path` below `root` with forward slashes.
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
