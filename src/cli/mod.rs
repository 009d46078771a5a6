//! CLI module for the fixture harness
//!
//! ## Usage
//!
//! `fixture-harness [OPTIONS] <DIR>` builds the program under test once, then runs it on every input fixture in
//! `DIR` and diffs the result against the matching expected output.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use crate::fixtures::PairingMode;
use crate::harness::{DEFAULT_BUILD_COMMAND, DEFAULT_OUTPUT, DEFAULT_PROGRAM_COMMAND, HarnessConfig, HarnessError};
use crate::version::HARNESS_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// At least one fixture failed
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run could not start or finish (bad fixtures, aborted build, bad command line)
    pub const ERROR: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(e: HarnessError) -> Self {
        CliError::new(format!("Error: {e}"), ExitCode::ERROR)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Output format for test progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// `Test <N> completed` lines with diffs inline
    #[default]
    Console,
    /// One JSON object per event
    Json,
}

/// Build a program once and diff its output against paired fixtures
#[derive(Parser, Debug)]
#[command(name = "fixture-harness")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Build a program once and diff its output against paired fixtures", long_about = None)]
pub struct Cli {
    /// Directory containing i* input files and o* expected-output files
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Build command, run once before any fixture
    #[arg(long = "build", value_name = "CMD", default_value = DEFAULT_BUILD_COMMAND, conflicts_with = "no_build")]
    pub build: String,

    /// Skip the build step
    #[arg(long = "no-build")]
    pub no_build: bool,

    /// Program under test; input and output paths are appended as arguments
    #[arg(long = "program", value_name = "CMD", default_value = DEFAULT_PROGRAM_COMMAND)]
    pub program: String,

    /// File the program writes to, shared by every fixture
    #[arg(long = "output", value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// External diff tool, run as `<CMD> <actual> <expected>` (default: built-in line diff)
    #[arg(long = "diff-tool", value_name = "CMD")]
    pub diff_tool: Option<String>,

    /// How inputs are matched with expected outputs
    #[arg(long, value_enum, default_value_t = PairingMode::Positional)]
    pub pairing: PairingMode,

    /// Progress output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    pub format: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,

    /// Exit with an error when the build fails instead of running the fixtures anyway
    #[arg(long = "abort-on-build-failure")]
    pub abort_on_build_failure: bool,

    /// Only run fixtures whose input file name contains EXPR
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,
}

impl Cli {
    /// Harness configuration described by the parsed flags.
    pub fn to_config(&self) -> HarnessConfig {
        HarnessConfig::new()
            .with_fixture_dir(self.dir.clone())
            .with_build_command((!self.no_build).then(|| self.build.clone()))
            .with_program_command(self.program.clone())
            .with_output_path(self.output.clone())
            .with_diff_tool(self.diff_tool.clone())
            .with_pairing(self.pairing)
            .with_stop_on_fail(self.stop_on_fail)
            .with_abort_on_build_failure(self.abort_on_build_failure)
            .with_filter(self.filter.clone())
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.to_config();
    tracing::debug!(?config, "starting harness");
    commands::run_fixtures(&config, cli.format, cli.verbose)
}

// ============================================================================
// Tests
// ============================================================================
