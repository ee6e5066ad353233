//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use console::Term;
use console::style;
use upack_core::RunReport;
use upack_core::TargetReport;

pub struct HumanFormatter {
    use_colors: bool,
    use_colors_stderr: bool,
    out: Term,
    err: Term,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: console::colors_enabled(),
            use_colors_stderr: console::colors_enabled_stderr(),
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn plural(n: usize, word: &str) -> String {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    }

    /// Summary of one target, without styling.
    fn target_summary(module: &str, target: &TargetReport) -> String {
        let mut parts = vec![
            Self::plural(target.extract.files_extracted, "file"),
            Self::format_size(target.extract.bytes_written),
        ];
        if let Some(filter) = &target.filter {
            parts.push(format!("{} excluded", filter.files_excluded));
        }
        if !target.backups.is_empty() {
            parts.push(Self::plural(target.backups.len(), "backup"));
        }

        format!(
            "{}: {module} ({})",
            target.target.display(),
            parts.join(", ")
        )
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_run_result(&self, report: &RunReport) {
        for target in &report.targets {
            let line = Self::target_summary(&report.module, target);
            if self.use_colors {
                let _ = self
                    .out
                    .write_line(&format!("{} {line}", style("✓").green().bold()));
            } else {
                let _ = self.out.write_line(&line);
            }
        }
    }

    fn format_error(&self, error: &anyhow::Error) {
        let message = format!("{error:#}").replace('\n', " ");
        if self.use_colors_stderr {
            let _ = self.err.write_line(&format!(
                "{} {message}",
                style("error:").for_stderr().red().bold()
            ));
        } else {
            let _ = self.err.write_line(&format!("error: {message}"));
        }
    }
}
