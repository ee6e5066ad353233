//! Output formatter trait for CLI results.

use upack_core::RunReport;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format a completed run, one line per target
    fn format_run_result(&self, report: &RunReport);

    /// Format the error that ended a run as a single line
    fn format_error(&self, error: &anyhow::Error);
}
