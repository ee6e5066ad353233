//! Error types for the packing pipeline.

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Broad class of a pipeline failure.
///
/// The category tells the caller how far the run got before failing:
/// configuration and build errors happen before any target is touched,
/// archive and filesystem errors abort the target being processed, and
/// template errors abort the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing inputs.
    Config,
    /// External build failure or missing build output.
    Build,
    /// Extraction or rebuild failure.
    Archive,
    /// Manifest template failure.
    Template,
    /// Backup, delete or write failure on the destination.
    Filesystem,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Config => "configuration error",
            Self::Build => "build error",
            Self::Archive => "archive error",
            Self::Template => "template error",
            Self::Filesystem => "filesystem error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while packing a module.
#[derive(Error, Debug)]
pub enum Error {
    /// A configured path is not absolute.
    #[error("path is not absolute: {path}")]
    RelativePath {
        /// The offending path.
        path: PathBuf,
    },

    /// A required path does not exist or cannot be inspected.
    #[error("{what} not found at {path}")]
    PathNotFound {
        /// What was expected at the path.
        what: &'static str,
        /// The offending path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A path exists but is not a directory.
    #[error("{what} is not a directory: {path}")]
    NotADirectory {
        /// What was expected at the path.
        what: &'static str,
        /// The offending path.
        path: PathBuf,
    },

    /// The module name is empty or is not a single path component.
    #[error("invalid module name: {name:?}")]
    InvalidModuleName {
        /// The rejected name.
        name: String,
    },

    /// The nested archive name is empty or is not a single path component.
    #[error("invalid nested archive name: {name:?}")]
    InvalidNestedArchiveName {
        /// The rejected name.
        name: String,
    },

    /// No output target was configured.
    #[error("no output directory configured")]
    NoTargets,

    /// The build command could not be started.
    #[error("failed to run {command}")]
    BuildSpawnFailed {
        /// Command line that was attempted.
        command: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The build command exited unsuccessfully.
    #[error("{command} failed ({})", exit_status(*.code))]
    BuildFailed {
        /// Command line that was run.
        command: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
    },

    /// The build finished but the expected archive is not there.
    #[error("build output not found: {path}")]
    BuildArtifactMissing {
        /// The expected archive path.
        path: PathBuf,
    },

    /// An archive could not be opened or is not a valid zip file.
    #[error("cannot open archive {path}")]
    ArchiveOpenFailed {
        /// The archive path.
        path: PathBuf,
        /// Underlying zip error.
        #[source]
        source: ZipError,
    },

    /// An entry could not be read from an archive.
    #[error("cannot read entry #{index} of {path}")]
    ArchiveReadFailed {
        /// The archive path.
        path: PathBuf,
        /// Index of the entry in the archive.
        index: usize,
        /// Underlying zip error.
        #[source]
        source: ZipError,
    },

    /// An entry would be written outside the destination directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The entry name as stored in the archive.
        path: PathBuf,
    },

    /// An extracted entry could not be created or written.
    #[error("cannot write entry {entry} to {path}")]
    EntryWriteFailed {
        /// The entry name as stored in the archive.
        entry: String,
        /// The destination path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The source directory of a rebuild cannot be read.
    #[error("cannot read source directory {path}")]
    SourceReadFailed {
        /// The source directory.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A file below the rebuild source cannot be read.
    #[error("cannot read {path}")]
    EntryReadFailed {
        /// The unreadable path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The output archive of a rebuild cannot be created.
    #[error("cannot create archive {path}")]
    ArchiveCreateFailed {
        /// The output path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The zip writer failed while adding an entry or finishing the archive.
    #[error("cannot write archive entry {entry}")]
    ArchiveWriteFailed {
        /// The entry being written, or the archive path when finishing.
        entry: String,
        /// Underlying zip error.
        #[source]
        source: ZipError,
    },

    /// The manifest template file cannot be read.
    #[error("cannot load manifest template {path}")]
    TemplateLoadFailed {
        /// The template path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest template has invalid syntax.
    #[error("invalid manifest template {name}")]
    TemplateParseFailed {
        /// Template name (`default` or the template path).
        name: String,
        /// Underlying parse error.
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// The manifest template could not be rendered.
    #[error("cannot render manifest template {name}")]
    TemplateRenderFailed {
        /// Template name (`default` or the template path).
        name: String,
        /// Underlying render error.
        #[source]
        source: Box<handlebars::RenderError>,
    },

    /// Existing content could not be deleted or moved aside.
    #[error("cannot back up or remove {path}")]
    BackupFailed {
        /// The path being cleared.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be created.
    #[error("cannot create directory {path}")]
    CreateDirFailed {
        /// The directory path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A generated file could not be written.
    #[error("cannot write {path}")]
    WriteFailed {
        /// The file path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

fn exit_status(code: Option<i32>) -> String {
    code.map_or_else(
        || "terminated by signal".to_string(),
        |code| format!("exit code {code}"),
    )
}

impl Error {
    /// Returns the category of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use upack_core::Error;
    /// use upack_core::ErrorCategory;
    ///
    /// let err = Error::PathTraversal {
    ///     path: PathBuf::from("../evil"),
    /// };
    /// assert_eq!(err.category(), ErrorCategory::Archive);
    /// ```
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::RelativePath { .. }
            | Self::PathNotFound { .. }
            | Self::NotADirectory { .. }
            | Self::InvalidModuleName { .. }
            | Self::InvalidNestedArchiveName { .. }
            | Self::NoTargets => ErrorCategory::Config,
            Self::BuildSpawnFailed { .. }
            | Self::BuildFailed { .. }
            | Self::BuildArtifactMissing { .. } => ErrorCategory::Build,
            Self::ArchiveOpenFailed { .. }
            | Self::ArchiveReadFailed { .. }
            | Self::PathTraversal { .. }
            | Self::EntryWriteFailed { .. }
            | Self::SourceReadFailed { .. }
            | Self::EntryReadFailed { .. }
            | Self::ArchiveCreateFailed { .. }
            | Self::ArchiveWriteFailed { .. } => ErrorCategory::Archive,
            Self::TemplateLoadFailed { .. }
            | Self::TemplateParseFailed { .. }
            | Self::TemplateRenderFailed { .. } => ErrorCategory::Template,
            Self::BackupFailed { .. } | Self::CreateDirFailed { .. } | Self::WriteFailed { .. } => {
                ErrorCategory::Filesystem
            }
        }
    }

    /// Returns `true` if an archive entry tried to escape its destination.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use upack_core::Error;
    ///
    /// let err = Error::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    /// assert!(!Error::NoTargets.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathTraversal { .. })
    }

    /// Returns the offending path, if this error carries one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::RelativePath { path }
            | Self::PathNotFound { path, .. }
            | Self::NotADirectory { path, .. }
            | Self::BuildArtifactMissing { path }
            | Self::ArchiveOpenFailed { path, .. }
            | Self::ArchiveReadFailed { path, .. }
            | Self::PathTraversal { path }
            | Self::EntryWriteFailed { path, .. }
            | Self::SourceReadFailed { path, .. }
            | Self::EntryReadFailed { path, .. }
            | Self::ArchiveCreateFailed { path, .. }
            | Self::TemplateLoadFailed { path, .. }
            | Self::BackupFailed { path, .. }
            | Self::CreateDirFailed { path, .. }
            | Self::WriteFailed { path, .. } => Some(path),
            Self::InvalidModuleName { .. }
            | Self::InvalidNestedArchiveName { .. }
            | Self::NoTargets
            | Self::BuildSpawnFailed { .. }
            | Self::BuildFailed { .. }
            | Self::ArchiveWriteFailed { .. }
            | Self::TemplateParseFailed { .. }
            | Self::TemplateRenderFailed { .. } => None,
        }
    }
}
