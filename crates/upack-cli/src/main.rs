//! upack - packs an Android library module into Unity plugin directories.

mod cli;
mod error;
mod output;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use upack_core::BuildStep;
use upack_core::GradleBuild;
use upack_core::Pipeline;
use upack_core::PrebuiltArtifact;
use upack_core::RunReport;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    let formatter = output::create_formatter();
    match run(&cli) {
        Ok(report) => {
            formatter.format_run_result(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            formatter.format_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &cli::Cli) -> Result<RunReport> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let config = cli.to_config(&cwd);
    debug!(?config, "configuration");

    let build: Box<dyn BuildStep> = if cli.skip_build {
        Box::new(PrebuiltArtifact)
    } else if let Some(program) = &cli.gradle {
        Box::new(GradleBuild::with_program(program))
    } else {
        Box::new(GradleBuild::new())
    };

    let report = error::add_pack_context(Pipeline::new(&config, build).run())?;
    debug!(duration = ?report.duration, artifact = %report.artifact.display(), "run complete");
    Ok(report)
}

/// Initializes logging to stderr.
///
/// Without `-v` the `RUST_LOG` filter applies, defaulting to warnings and
/// errors.
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("warn,upack=debug,upack_core=debug"),
        _ => EnvFilter::new("warn,upack=trace,upack_core=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
