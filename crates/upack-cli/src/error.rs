//! Error conversion utilities for CLI.
//!
//! Converts upack-core's typed errors (thiserror) into contextual errors
//! (anyhow) prefixed with the error category, so the single error line the
//! CLI prints says which part of the run failed.

use anyhow::anyhow;
use upack_core::Error;

/// Converts a pipeline error to an anyhow error with category context.
pub fn convert_pack_error(err: Error) -> anyhow::Error {
    let category = err.category();
    if err.is_security_violation() {
        let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
        return anyhow!(
            "{category}: security violation: archive entry '{path}' escapes the destination directory"
        );
    }
    anyhow::Error::new(err).context(category.to_string())
}

/// Adds category context to a pipeline result.
pub fn add_pack_context<T>(result: Result<T, Error>) -> anyhow::Result<T> {
    result.map_err(convert_pack_error)
}
