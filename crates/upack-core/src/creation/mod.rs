//! Archive rebuilding.
//!
//! This module walks a directory tree and writes the files it finds into a
//! new zip archive, filtered by a per-file inclusion predicate.

pub mod filters;
pub mod walker;
pub mod zip;

// Re-exports for public API
pub use filters::ExclusionFilter;
pub use walker::TreeWalker;
pub use walker::WalkEntry;
pub use self::zip::create_archive;
pub use self::zip::write_archive;
