//! Archive extraction.

pub mod engine;
pub mod stream;

pub use engine::extract_archive;
