//! Property-based tests for extraction, rebuilding and replacement.
//!
//! These tests use proptest to generate arbitrary archive contents and
//! verify the invariants hold across a wide range of cases.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;
use upack_core::DestDir;
use upack_core::ReplacePolicy;
use upack_core::creation::ExclusionFilter;
use upack_core::creation::create_archive;
use upack_core::extract_archive;
use upack_core::test_utils::ZipTestBuilder;
use upack_core::test_utils::read_file_tree;
use upack_core::test_utils::read_zip_entries;

/// Relative file paths with 1-4 short segments.
fn entry_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9_]{1,8}", 1..4).prop_map(|parts| parts.join("/"))
}

/// A set of files where no path is a prefix directory of another.
fn file_set() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(entry_path(), prop::collection::vec(any::<u8>(), 0..256), 0..12)
        .prop_map(|files| {
            let names: Vec<String> = files.keys().cloned().collect();
            files
                .into_iter()
                .filter(|(name, _)| {
                    !names
                        .iter()
                        .any(|other| other.starts_with(&format!("{name}/")))
                })
                .collect()
        })
}

fn build_zip(files: &BTreeMap<String, Vec<u8>>) -> Vec<u8> {
    files
        .iter()
        .fold(ZipTestBuilder::new(), |builder, (name, data)| {
            builder.add_file(name, data)
        })
        .build()
}

proptest! {
    /// extract -> rebuild everything -> extract gives the same files.
    #[test]
    fn prop_rebuild_round_trip_is_identity(files in file_set()) {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("in.zip");
        fs::write(&archive, build_zip(&files)).unwrap();

        let first = temp.path().join("first");
        extract_archive(&archive, &first).unwrap();
        let rebuilt = temp.path().join("rebuilt.zip");
        create_archive(&first, &rebuilt, |_| true).unwrap();
        let second = temp.path().join("second");
        extract_archive(&rebuilt, &second).unwrap();

        prop_assert_eq!(read_file_tree(&first), files);
        prop_assert_eq!(read_file_tree(&second), read_file_tree(&first));
    }

    /// Rebuilding with an exclusion filter drops exactly the matching files.
    #[test]
    fn prop_filter_removes_exactly_matching(
        files in file_set(),
        exclusions in prop::collection::vec("[a-zA-Z0-9_/]{0,4}", 0..3),
    ) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        for (name, data) in &files {
            let path = source.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, data).unwrap();
        }
        fs::create_dir_all(&source).unwrap();

        let filter = ExclusionFilter::new(&exclusions);
        let output = temp.path().join("out.zip");
        let report = create_archive(&source, &output, |p| filter.keep(p)).unwrap();

        let expected: BTreeMap<String, Vec<u8>> = files
            .iter()
            .filter(|(name, _)| {
                !exclusions
                    .iter()
                    .any(|s| !s.is_empty() && name.contains(s.as_str()))
            })
            .map(|(name, data)| (name.clone(), data.clone()))
            .collect();

        prop_assert_eq!(report.files_added, expected.len());
        prop_assert_eq!(report.files_seen(), files.len());
        prop_assert_eq!(read_zip_entries(&output), expected);
    }

    /// Any entry name with a `..` that climbs above the root is rejected.
    #[test]
    fn prop_escaping_names_rejected(
        depth in 0usize..3,
        name in "[a-z]{1,8}",
    ) {
        let temp = TempDir::new().unwrap();
        let dest = DestDir::new(temp.path()).unwrap();
        let parents = "../".repeat(depth + 1);
        let prefix = "a/".repeat(depth);
        let entry = format!("{prefix}{parents}{name}");

        let result = dest.resolve(&entry);
        prop_assert!(result.is_err(), "{} accepted", entry);
    }

    /// Names that stay inside the root resolve to a path under it.
    #[test]
    fn prop_contained_names_resolve_below_root(name in entry_path()) {
        let temp = TempDir::new().unwrap();
        let dest = DestDir::new(temp.path()).unwrap();

        let resolved = dest.resolve(&name).unwrap();
        prop_assert!(resolved.starts_with(dest.as_path()));
        prop_assert_ne!(resolved.as_path(), dest.as_path());
    }

    /// Replacing twice with a backup leaves the latest content and exactly
    /// one backup holding the content it displaced.
    #[test]
    fn prop_backup_keeps_immediately_prior_content(
        contents in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..5),
        ext in "\\.[a-z]{1,4}",
    ) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AndroidManifest.xml");
        let policy = ReplacePolicy::new(Some(ext.clone()));

        for data in &contents {
            policy.replace_file(&path, data).unwrap();
        }

        prop_assert_eq!(&fs::read(&path).unwrap(), contents.last().unwrap());
        let backup = temp.path().join(format!("AndroidManifest.xml{ext}"));
        if contents.len() > 1 {
            prop_assert_eq!(&fs::read(&backup).unwrap(), &contents[contents.len() - 2]);
        } else {
            prop_assert!(!backup.exists());
        }
        prop_assert!(fs::read_dir(temp.path()).unwrap().count() <= 2);
    }
}
