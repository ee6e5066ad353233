//! Repackaging of Android library archives for Unity projects.
//!
//! `upack-core` takes the `.aar` produced by an Android library module and
//! installs it as a Unity Android plugin: the archive is unpacked under
//! `<target>/<module>`, the nested `classes.jar` is optionally filtered, and
//! a library marker and a rendered `AndroidManifest.xml` are written next to
//! it. Anything already at those paths is deleted or renamed aside first.
//!
//! Archive entries are never written outside their destination directory.
//!
//! # Examples
//!
//! ```no_run
//! use upack_core::GradleBuild;
//! use upack_core::PackConfig;
//! use upack_core::Pipeline;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PackConfig::new("/work/android", "mymodule", "com.example.MainActivity")
//!     .with_target("/work/unity/Assets/Plugins/Android")
//!     .with_exclusions(vec!["com/example/BuildConfig".into()])
//!     .with_backup_extension(Some(".bak".into()));
//!
//! let report = Pipeline::new(&config, GradleBuild::new()).run()?;
//! for target in &report.targets {
//!     println!("{}: {} files", target.target.display(), target.extract.files_extracted);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
pub mod build;
pub mod config;
pub mod creation;
pub mod error;
pub mod extraction;
pub mod filter;
pub mod manifest;
pub mod pipeline;
pub mod report;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

// Re-export main API types
pub use backup::ReplacePolicy;
pub use build::BuildStep;
pub use build::GradleBuild;
pub use build::PrebuiltArtifact;
pub use config::PackConfig;
pub use error::Error;
pub use error::ErrorCategory;
pub use error::Result;
pub use extraction::extract_archive;
pub use pipeline::Pipeline;
pub use pipeline::Stage;
pub use report::CreateReport;
pub use report::ExtractReport;
pub use report::RunReport;
pub use report::TargetReport;
pub use types::DestDir;
