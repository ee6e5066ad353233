//! Test utilities for building and inspecting zip archives.
//!
//! This module provides reusable helpers for creating in-memory test archives
//! and fake Android project layouts, reducing duplication across unit,
//! integration and CLI tests.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

/// Creates an in-memory ZIP archive from a list of entries.
///
/// Each entry is a tuple of (path, content). Files are stored uncompressed
/// with mode 0o644.
///
/// # Examples
///
/// ```
/// use upack_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(vec![("file.txt", b"hello"), ("dir/nested.txt", b"world")]);
/// ```
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    entries
        .into_iter()
        .fold(ZipTestBuilder::new(), |builder, (path, data)| {
            builder.add_file(path, data)
        })
        .build()
}

/// Builder for creating ZIP test archives.
///
/// # Examples
///
/// ```
/// use upack_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_file("file.txt", b"content")
///     .add_directory("dir/")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Adds a regular file to the archive.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a regular file with custom mode.
    #[must_use]
    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(mode);

        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory to the archive.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Builds and returns the ZIP archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads every file entry of a zip archive into a map keyed by entry name.
///
/// Directory entries are skipped.
#[must_use]
pub fn read_zip_entries(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).unwrap();
        if entry.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        entries.insert(entry.name().to_string(), data);
    }

    entries
}

/// Reads every file below `root` into a map keyed by forward-slash relative
/// path.
#[must_use]
pub fn read_file_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap();
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (key, std::fs::read(entry.path()).unwrap())
        })
        .collect()
}

/// Lays out a fake Android project whose build output already exists.
///
/// Creates `<root>/<module>/build/outputs/aar/<module>-<variant>.aar` with
/// `aar_data` and returns the artifact path.
#[must_use]
pub fn fake_android_project(root: &Path, module: &str, variant: &str, aar_data: &[u8]) -> PathBuf {
    let aar_dir = root.join(module).join("build").join("outputs").join("aar");
    std::fs::create_dir_all(&aar_dir).unwrap();
    let artifact = aar_dir.join(format!("{module}-{variant}.aar"));
    std::fs::write(&artifact, aar_data).unwrap();
    artifact
}

/// Builds the module archive used by the end-to-end scenarios: a
/// `classes.jar` holding `com/example/Foo.class` and `com/unity/Keep.class`,
/// plus an `AndroidManifest.xml`.
#[must_use]
pub fn sample_aar() -> Vec<u8> {
    let classes = ZipTestBuilder::new()
        .add_directory("com/")
        .add_directory("com/example/")
        .add_file("com/example/Foo.class", b"\xca\xfe\xba\xbe foo")
        .add_directory("com/unity/")
        .add_file("com/unity/Keep.class", b"\xca\xfe\xba\xbe keep")
        .build();

    ZipTestBuilder::new()
        .add_file("AndroidManifest.xml", b"<manifest package=\"com.example\"/>")
        .add_file("classes.jar", &classes)
        .add_directory("res/")
        .add_file("res/values/values.xml", b"<resources/>")
        .build()
}
