//! Output formatting module.

mod formatter;
mod human;

pub use formatter::OutputFormatter;

use human::HumanFormatter;

/// Creates the output formatter.
pub fn create_formatter() -> Box<dyn OutputFormatter> {
    Box::new(HumanFormatter::new())
}
