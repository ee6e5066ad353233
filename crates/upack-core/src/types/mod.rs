//! Validated path types.

mod dest_dir;

pub use dest_dir::DestDir;
pub use dest_dir::lexical_clean;
