//! Nested archive filtering.
//!
//! The module archive carries its compiled classes in a nested jar. When
//! exclusions are configured, that jar is unpacked to a scratch directory,
//! rebuilt without the excluded entries, and swapped in place of the
//! original.

use crate::CreateReport;
use crate::Error;
use crate::Result;
use crate::creation::ExclusionFilter;
use crate::creation::write_archive;
use crate::extraction::extract_archive;
use std::fs;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;
use tracing::trace;
use tracing::warn;

/// Removes every entry of `jar` whose path contains one of `exclusions`.
///
/// The scratch directory is created inside `scratch_parent` and removed
/// before this returns, whether or not the rebuild succeeded. The jar is
/// only replaced once the rebuilt archive is complete; on failure the
/// original is left untouched.
///
/// # Errors
///
/// Any extraction or rebuild error, [`Error::CreateDirFailed`] if the scratch
/// directory cannot be created, [`Error::ArchiveCreateFailed`] if the
/// replacement cannot be created or moved over the jar.
pub fn filter_nested_archive(
    jar: &Path,
    exclusions: &[String],
    scratch_parent: &Path,
) -> Result<CreateReport> {
    let scratch = tempfile::Builder::new()
        .prefix(".upack-scratch-")
        .tempdir_in(scratch_parent)
        .map_err(|source| Error::CreateDirFailed {
            path: scratch_parent.to_path_buf(),
            source,
        })?;
    debug!(jar = %jar.display(), scratch = %scratch.path().display(), "filtering nested archive");

    let result = rebuild_filtered(jar, exclusions, scratch.path());

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!(path = %scratch_path.display(), error = %e, "failed to remove scratch directory");
    }

    result
}

fn rebuild_filtered(jar: &Path, exclusions: &[String], scratch: &Path) -> Result<CreateReport> {
    extract_archive(jar, scratch)?;

    let jar_dir = jar.parent().unwrap_or_else(|| Path::new("."));
    let create_failed = |source: std::io::Error| Error::ArchiveCreateFailed {
        path: jar.to_path_buf(),
        source,
    };

    let permissions = fs::metadata(jar).map_err(create_failed)?.permissions();
    let rebuilt = NamedTempFile::new_in(jar_dir).map_err(create_failed)?;
    let filter = ExclusionFilter::new(exclusions);
    let mut writer = BufWriter::new(rebuilt);
    let report = write_archive(scratch, &mut writer, |path| match filter.matching(path) {
        Some(exclusion) => {
            trace!(entry = path, exclusion, "excluded");
            false
        }
        None => true,
    })?;
    writer.flush().map_err(create_failed)?;

    let rebuilt = writer
        .into_inner()
        .map_err(|e| create_failed(e.into_error()))?;
    rebuilt
        .as_file()
        .set_permissions(permissions)
        .map_err(create_failed)?;
    rebuilt.persist(jar).map_err(|e| create_failed(e.error))?;

    debug!(
        jar = %jar.display(),
        kept = report.files_added,
        excluded = report.files_excluded,
        "nested archive rebuilt"
    );
    Ok(report)
}
