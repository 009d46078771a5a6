//! Command implementations for the CLI
//!
//! Commands return `CliResult<ExitCode>`; the caller owns process exit.

use crate::harness::{self, ConsoleReporter, HarnessConfig, JsonReporter, RunSummary, TestReporter};

use super::{CliError, CliResult, ExitCode, ReportFormat};

/// Run every fixture pair described by `config`, reporting in `format`.
pub fn run_fixtures(config: &HarnessConfig, format: ReportFormat, verbose: bool) -> CliResult<ExitCode> {
    let mut reporter: Box<dyn TestReporter> = match format {
        ReportFormat::Console => Box::new(ConsoleReporter::new(verbose)),
        ReportFormat::Json => Box::new(JsonReporter::new()),
    };

    let summary = harness::run_harness(config, reporter.as_mut())?;
    exit_code_for(&summary)
}

fn exit_code_for(summary: &RunSummary) -> CliResult<ExitCode> {
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already printed by the reporter
        Err(CliError::failure(""))
    }
}
