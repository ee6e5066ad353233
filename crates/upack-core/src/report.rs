//! Operation reports.

use std::path::PathBuf;
use std::time::Duration;

/// Report of an archive extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Number of file entries written.
    pub files_extracted: usize,

    /// Number of directory entries created.
    pub directories_created: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,
}

impl ExtractReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns total number of entries processed.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created
    }
}

/// Report of an archive rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReport {
    /// Number of files written into the archive.
    pub files_added: usize,

    /// Number of files rejected by the inclusion predicate.
    pub files_excluded: usize,

    /// Total uncompressed bytes written into the archive.
    pub bytes_written: u64,
}

impl CreateReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of files the walk visited.
    #[must_use]
    pub fn files_seen(&self) -> usize {
        self.files_added + self.files_excluded
    }
}

/// What one output target received during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    /// The target directory.
    pub target: PathBuf,

    /// `<target>/<module>`.
    pub plugin_dir: PathBuf,

    /// Extraction of the module archive into `plugin_dir`.
    pub extract: ExtractReport,

    /// Nested archive filtering, when exclusions were configured.
    pub filter: Option<CreateReport>,

    /// Backups made while clearing destinations, in the order they were made.
    pub backups: Vec<PathBuf>,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Module that was packed.
    pub module: String,

    /// The archive produced by the build.
    pub artifact: PathBuf,

    /// One entry per target, in configuration order.
    pub targets: Vec<TargetReport>,

    /// Wall-clock duration of the run.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_report_totals() {
        let report = ExtractReport {
            files_extracted: 3,
            directories_created: 2,
            bytes_written: 10,
        };
        assert_eq!(report.total_items(), 5);
        assert_eq!(ExtractReport::new().total_items(), 0);
    }

    #[test]
    fn test_create_report_files_seen() {
        let report = CreateReport {
            files_added: 4,
            files_excluded: 1,
            bytes_written: 0,
        };
        assert_eq!(report.files_seen(), 5);
    }
}
