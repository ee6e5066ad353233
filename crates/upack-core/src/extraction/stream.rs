//! File entry writing.

use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

/// Permission bits used when an archive entry records none.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Writes `reader` to `path`, truncating any existing file.
///
/// On Unix the file is created with `mode` and the permission bits are set
/// again after the copy, so a pre-existing file also ends up with `mode`.
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns the underlying I/O error from open, copy, flush or chmod.
pub fn write_file<R: Read + ?Sized>(reader: &mut R, path: &Path, mode: u32) -> std::io::Result<u64> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode & 0o7777);
    }

    let file = options.open(path)?;
    let mut writer = BufWriter::with_capacity(64 * 1024, file);
    let bytes = std::io::copy(reader, &mut writer)?;
    writer.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_copies_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.bin");
        let mut reader = Cursor::new(vec![1u8, 2, 3]);

        let written = write_file(&mut reader, &path, DEFAULT_FILE_MODE).unwrap();

        assert_eq!(written, 3);
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_write_file_truncates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.txt");
        std::fs::write(&path, "a much longer previous content").unwrap();

        write_file(&mut Cursor::new(b"new"), &path, DEFAULT_FILE_MODE).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_file_applies_mode_to_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gradlew");
        std::fs::write(&path, "old").unwrap();

        write_file(&mut Cursor::new(b"#!/bin/sh"), &path, 0o755).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
