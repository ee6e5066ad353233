//! ZIP archive rebuilding.
//!
//! Writes the files found by [`TreeWalker`] into a new archive, keeping only
//! those accepted by a caller-supplied predicate.

use crate::CreateReport;
use crate::Error;
use crate::Result;
use crate::creation::walker::TreeWalker;
use std::fs::File;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use tracing::trace;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

/// Creates a ZIP archive at `output` from the files below `source`.
///
/// `keep` is called with each file's forward-slash relative path; files it
/// rejects are left out. Directories are always traversed and never get
/// entries of their own.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use upack_core::creation::create_archive;
///
/// let report = create_archive(Path::new("scratch"), Path::new("classes.jar"), |path| {
///     !path.contains("com/example")
/// })?;
/// println!("kept {} files", report.files_added);
/// # Ok::<(), upack_core::Error>(())
/// ```
///
/// # Errors
///
/// - [`Error::SourceReadFailed`] if `source` is missing or not a directory
/// - [`Error::ArchiveCreateFailed`] if `output` cannot be created
/// - [`Error::EntryReadFailed`] if any file below `source` cannot be read;
///   the rest of the walk is abandoned
/// - [`Error::ArchiveWriteFailed`] if the zip writer fails
pub fn create_archive<F>(source: &Path, output: &Path, keep: F) -> Result<CreateReport>
where
    F: FnMut(&str) -> bool,
{
    check_source(source)?;
    let file = File::create(output).map_err(|e| Error::ArchiveCreateFailed {
        path: output.to_path_buf(),
        source: e,
    })?;
    write_archive(source, file, keep)
}

/// Entry name reported when writing the archive trailer fails.
pub const CENTRAL_DIRECTORY: &str = "<central directory>";

/// Writes a ZIP archive of the files below `source` into `writer`.
///
/// Same contract as [`create_archive`] for any seekable writer; the writer
/// is flushed and returned inside the zip trailer before this returns.
///
/// # Errors
///
/// See [`create_archive`].
pub fn write_archive<W, F>(source: &Path, writer: W, mut keep: F) -> Result<CreateReport>
where
    W: Write + Seek,
    F: FnMut(&str) -> bool,
{
    check_source(source)?;

    let mut zip = ZipWriter::new(writer);
    let mut report = CreateReport::new();
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    // Reused across files
    let mut buffer = vec![0u8; 64 * 1024];

    for entry in TreeWalker::new(source).walk() {
        let entry = entry?;
        if entry.is_dir {
            continue;
        }

        if !keep(&entry.relative) {
            trace!(entry = %entry.relative, "excluding file");
            report.files_excluded += 1;
            continue;
        }

        trace!(entry = %entry.relative, "adding file");
        let bytes = add_file(&mut zip, &entry.path, &entry.relative, options, &mut buffer)?;
        report.files_added += 1;
        report.bytes_written += bytes;
    }

    zip.finish().map_err(|source_err| Error::ArchiveWriteFailed {
        entry: CENTRAL_DIRECTORY.to_string(),
        source: source_err,
    })?;

    debug!(
        source = %source.display(),
        added = report.files_added,
        excluded = report.files_excluded,
        bytes = report.bytes_written,
        "archive rebuilt"
    );

    Ok(report)
}

fn check_source(source: &Path) -> Result<()> {
    let metadata = std::fs::metadata(source).map_err(|e| Error::SourceReadFailed {
        path: source.to_path_buf(),
        source: e,
    })?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(Error::SourceReadFailed {
            path: source.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                "rebuild source is not a directory",
            ),
        })
    }
}

/// Adds one file to the archive with its unix mode, returning bytes copied.
fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &Path,
    name: &str,
    options: SimpleFileOptions,
    buffer: &mut [u8],
) -> Result<u64> {
    let read_failed = |source: std::io::Error| Error::EntryReadFailed {
        path: path.to_path_buf(),
        source,
    };
    let write_failed = |source: ZipError| Error::ArchiveWriteFailed {
        entry: name.to_string(),
        source,
    };

    let mut file = File::open(path).map_err(read_failed)?;
    let metadata = file.metadata().map_err(read_failed)?;

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode() & 0o7777)
    };
    #[cfg(not(unix))]
    let _ = metadata;

    zip.start_file(name, options).map_err(write_failed)?;

    let mut bytes_written = 0u64;
    loop {
        let bytes_read = file.read(buffer).map_err(read_failed)?;
        if bytes_read == 0 {
            break;
        }
        zip.write_all(&buffer[..bytes_read])
            .map_err(|e| write_failed(ZipError::Io(e)))?;
        bytes_written += bytes_read as u64;
    }

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::read_zip_entries;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("com/example")).unwrap();
        fs::create_dir_all(root.join("com/unity")).unwrap();
        fs::create_dir_all(root.join("META-INF")).unwrap();
        fs::write(root.join("com/example/Foo.class"), "foo").unwrap();
        fs::write(root.join("com/unity/Keep.class"), "keep").unwrap();
        fs::write(root.join("META-INF/MANIFEST.MF"), "Manifest-Version: 1.0").unwrap();
        temp
    }

    #[test]
    fn test_create_archive_keeps_all() {
        let source = sample_tree();
        let out = TempDir::new().unwrap();
        let output = out.path().join("classes.jar");

        let report = create_archive(source.path(), &output, |_| true).unwrap();

        assert_eq!(report.files_added, 3);
        assert_eq!(report.files_excluded, 0);
        let entries = read_zip_entries(&output);
        assert_eq!(
            entries.keys().map(String::as_str).collect::<Vec<_>>(),
            ["META-INF/MANIFEST.MF", "com/example/Foo.class", "com/unity/Keep.class"]
        );
        assert_eq!(entries["com/unity/Keep.class"], b"keep");
    }

    #[test]
    fn test_create_archive_applies_predicate_per_file() {
        let source = sample_tree();
        let out = TempDir::new().unwrap();
        let output = out.path().join("classes.jar");

        let report =
            create_archive(source.path(), &output, |p| !p.contains("com/example")).unwrap();

        assert_eq!(report.files_added, 2);
        assert_eq!(report.files_excluded, 1);
        let entries = read_zip_entries(&output);
        assert!(!entries.contains_key("com/example/Foo.class"));
        assert!(entries.contains_key("com/unity/Keep.class"));
    }

    #[test]
    fn test_predicate_never_sees_directories() {
        let source = sample_tree();
        let mut seen = Vec::new();

        write_archive(source.path(), Cursor::new(Vec::new()), |p| {
            seen.push(p.to_string());
            true
        })
        .unwrap();

        seen.sort();
        assert_eq!(
            seen,
            ["META-INF/MANIFEST.MF", "com/example/Foo.class", "com/unity/Keep.class"]
        );
    }

    #[test]
    fn test_no_directory_entries_written() {
        let source = sample_tree();
        let out = TempDir::new().unwrap();
        let output = out.path().join("classes.jar");

        create_archive(source.path(), &output, |_| true).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
        for index in 0..zip.len() {
            assert!(!zip.by_index(index).unwrap().is_dir());
        }
    }

    #[test]
    fn test_empty_source_produces_valid_archive() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let output = out.path().join("empty.jar");

        let report = create_archive(source.path(), &output, |_| true).unwrap();

        assert_eq!(report.files_seen(), 0);
        assert!(read_zip_entries(&output).is_empty());
    }

    #[test]
    fn test_missing_source() {
        let out = TempDir::new().unwrap();
        let err = create_archive(
            &out.path().join("missing"),
            &out.path().join("a.jar"),
            |_| true,
        )
        .unwrap_err();
        assert!(matches!(err, Error::SourceReadFailed { .. }));
        assert!(!out.path().join("a.jar").exists());
    }

    #[test]
    fn test_source_is_a_file() {
        let out = TempDir::new().unwrap();
        let file = out.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let err = create_archive(&file, &out.path().join("a.jar"), |_| true).unwrap_err();
        assert!(matches!(err, Error::SourceReadFailed { .. }));
    }

    /// Seekable writer that rejects every write.
    struct RejectingWriter;

    impl Write for RejectingWriter {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Seek for RejectingWriter {
        fn seek(&mut self, _: std::io::SeekFrom) -> std::io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_finish_failure_names_central_directory() {
        let source = TempDir::new().unwrap();

        let err = write_archive(source.path(), RejectingWriter, |_| true).unwrap_err();

        match err {
            Error::ArchiveWriteFailed { entry, .. } => assert_eq!(entry, CENTRAL_DIRECTORY),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_output_cannot_be_created() {
        let source = sample_tree();
        let out = TempDir::new().unwrap();
        let output = out.path().join("no/such/dir/a.jar");

        let err = create_archive(source.path(), &output, |_| true).unwrap_err();
        assert!(matches!(err, Error::ArchiveCreateFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_mode_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let source = TempDir::new().unwrap();
        let script = source.path().join("run.sh");
        fs::write(&script, "#!/bin/sh").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let out = TempDir::new().unwrap();
        let output = out.path().join("a.zip");

        create_archive(source.path(), &output, |_| true).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let entry = zip.by_name("run.sh").unwrap();
        assert_eq!(entry.unix_mode().unwrap() & 0o777, 0o755);
    }
}
