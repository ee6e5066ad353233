//! Zip extraction engine.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;
use tracing::trace;
use zip::ZipArchive;
use zip::result::ZipError;

use super::stream::DEFAULT_FILE_MODE;
use super::stream::write_file;
use crate::Error;
use crate::ExtractReport;
use crate::Result;
use crate::types::DestDir;

/// Extracts every entry of `archive` into `dest`.
///
/// The destination is created if it does not exist. Entries are processed
/// in archive order. Each entry name is resolved with [`DestDir::resolve`]
/// before anything is written for it, so an entry escaping the destination
/// fails the whole operation with [`Error::PathTraversal`]; entries written
/// before it are left in place.
///
/// Directory entries are created with all missing ancestors. File entries
/// get their ancestors created on demand and are written with the unix
/// permission bits recorded in the archive ([`DEFAULT_FILE_MODE`] when none).
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use upack_core::extract_archive;
///
/// let report = extract_archive(Path::new("mymodule-debug.aar"), Path::new("out/mymodule"))?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok::<(), upack_core::Error>(())
/// ```
///
/// # Errors
///
/// - [`Error::ArchiveOpenFailed`] if the file is missing or not a zip archive
/// - [`Error::ArchiveReadFailed`] if an entry header cannot be read
/// - [`Error::PathTraversal`] if an entry escapes the destination
/// - [`Error::EntryWriteFailed`] if an entry cannot be created or copied
/// - [`Error::CreateDirFailed`] if the destination cannot be created
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<ExtractReport> {
    let open_failed = |source: ZipError| Error::ArchiveOpenFailed {
        path: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(|e| open_failed(ZipError::Io(e)))?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(open_failed)?;

    std::fs::create_dir_all(dest).map_err(|source| Error::CreateDirFailed {
        path: dest.to_path_buf(),
        source,
    })?;
    let dest = DestDir::new(dest)?;

    debug!(
        archive = %archive.display(),
        dest = %dest.as_path().display(),
        entries = zip.len(),
        "extracting archive"
    );

    let mut report = ExtractReport::new();

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|source| Error::ArchiveReadFailed {
                path: archive.to_path_buf(),
                index,
                source,
            })?;

        let name = entry.name().to_string();
        let out_path = dest.resolve(&name)?;

        let write_failed = |source: std::io::Error| Error::EntryWriteFailed {
            entry: name.clone(),
            path: out_path.clone(),
            source,
        };

        if entry.is_dir() {
            trace!(path = %out_path.display(), "creating directory");
            std::fs::create_dir_all(&out_path).map_err(write_failed)?;
            report.directories_created += 1;
            continue;
        }

        trace!(path = %out_path.display(), "extracting file");
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let mode = entry.unix_mode().map_or(DEFAULT_FILE_MODE, |mode| mode & 0o7777);
        let bytes = write_file(&mut entry, &out_path, mode).map_err(write_failed)?;

        report.files_extracted += 1;
        report.bytes_written += bytes;
    }

    debug!(
        files = report.files_extracted,
        directories = report.directories_created,
        bytes = report.bytes_written,
        "extraction complete"
    );

    Ok(report)
}
