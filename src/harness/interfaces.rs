//! Harness I/O boundary interfaces
//!
//! The three external collaborators of a run sit behind traits:
//! - Build (one compile step before any fixture runs)
//! - Program execution (the program under test, once per fixture)
//! - Comparison (produced output vs expected output)
//!
//! The default implementations spawn real processes. Tests substitute in-memory fakes.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use imara_diff::intern::InternedInput;
use imara_diff::{Algorithm, UnifiedDiffBuilder, diff};
use thiserror::Error;

use crate::fixtures::FixtureError;

/// Errors that occur while driving the build, the program or the comparison
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Fixtures(#[from] FixtureError),

    #[error("invalid command line '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("build failed ({status})\n{output}")]
    BuildFailed { status: String, output: String },

    #[error("failed to read '{}': {source}", .path.display())]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("diff tool '{tool}' failed ({status}): {stderr}")]
    DiffTool { tool: String, status: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Command lines
// ============================================================================

/// A program plus its leading arguments, split with shell quoting rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn parse(line: &str) -> Result<Self, HarnessError> {
        let invalid = |reason: String| HarnessError::InvalidCommand {
            command: line.to_string(),
            reason,
        };

        let mut words = shell_words::split(line).map_err(|e| invalid(e.to_string()))?;
        if words.is_empty() {
            return Err(invalid("command is empty".to_string()));
        }
        let program = words.remove(0);
        Ok(Self { program, args: words })
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    fn output(&self, extra: &[&Path]) -> Result<Output, HarnessError> {
        let mut command = self.to_command();
        command.args(extra);
        command.output().map_err(|source| HarnessError::Spawn {
            program: self.program.clone(),
            source,
        })
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = std::iter::once(&self.program).chain(&self.args);
        write!(f, "{}", shell_words::join(words))
    }
}

fn describe_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

// ============================================================================
// Build Interface
// ============================================================================

/// Result of a successful build step.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    /// Combined stdout and stderr of the build command
    pub output: String,
    pub duration: Duration,
}

/// Compile the program under test. Called exactly once per run.
pub trait Builder {
    fn build(&self) -> Result<BuildOutcome, HarnessError>;
}

/// Runs a build command line; a nonzero exit is a [`HarnessError::BuildFailed`].
pub struct CommandBuilder {
    command: CommandLine,
}

impl CommandBuilder {
    pub fn new(command: CommandLine) -> Self {
        Self { command }
    }
}

impl Builder for CommandBuilder {
    fn build(&self) -> Result<BuildOutcome, HarnessError> {
        let start = Instant::now();
        tracing::info!(command = %self.command, "building program under test");

        let output = self.command.output(&[])?;
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(HarnessError::BuildFailed {
                status: describe_status(output.status.code()),
                output: combined,
            });
        }

        Ok(BuildOutcome {
            output: combined,
            duration: start.elapsed(),
        })
    }
}

/// Skips the build step.
pub struct NoBuild;

impl Builder for NoBuild {
    fn build(&self) -> Result<BuildOutcome, HarnessError> {
        tracing::debug!("build step skipped");
        Ok(BuildOutcome::default())
    }
}

// ============================================================================
// Program Interface
// ============================================================================

/// How one invocation of the program under test ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stderr: String,
}

/// Run the program under test on one input, writing to `output`.
pub trait ProgramRunner {
    fn run(&self, input: &Path, output: &Path) -> Result<RunOutcome, HarnessError>;
}

/// Appends the input and output paths to a command line and runs it.
pub struct CommandRunner {
    command: CommandLine,
}

impl CommandRunner {
    pub fn new(command: CommandLine) -> Self {
        Self { command }
    }
}

impl ProgramRunner for CommandRunner {
    fn run(&self, input: &Path, output: &Path) -> Result<RunOutcome, HarnessError> {
        let result = self.command.output(&[input, output])?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        if !stdout.is_empty() {
            tracing::debug!(input = %input.display(), %stdout, "program stdout");
        }

        Ok(RunOutcome {
            success: result.status.success(),
            code: result.status.code(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        })
    }
}

// ============================================================================
// Comparison Interface
// ============================================================================

/// Result of comparing produced output with expected output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Same,
    /// Outputs differ; carries the rendered diff
    Differ(String),
}

pub trait Comparator {
    fn compare(&self, actual: &Path, expected: &Path) -> Result<Comparison, HarnessError>;
}

/// In-process line comparison with a unified diff on mismatch.
///
/// Lines are compared without their terminators, so `\r\n` vs `\n` and a missing final newline are not differences.
/// Files need not be UTF-8: lines are compared as bytes and only rendered lossily.
#[derive(Debug, Default)]
pub struct LineDiff;

impl Comparator for LineDiff {
    fn compare(&self, actual: &Path, expected: &Path) -> Result<Comparison, HarnessError> {
        let read = |path: &Path| {
            fs::read(path).map_err(|source| HarnessError::ReadOutput {
                path: path.to_path_buf(),
                source,
            })
        };
        let actual_bytes = read(actual)?;
        let expected_bytes = read(expected)?;

        if byte_lines(&actual_bytes).eq(byte_lines(&expected_bytes)) {
            return Ok(Comparison::Same);
        }

        let actual_label = actual.display().to_string();
        let expected_label = expected.display().to_string();
        let diff = render_line_diff(
            &String::from_utf8_lossy(&actual_bytes),
            &String::from_utf8_lossy(&expected_bytes),
            &actual_label,
            &expected_label,
        )
        // Lines that differ only in invalid bytes render identically
        .unwrap_or_else(|| format!("Binary files {actual_label} and {expected_label} differ\n"));
        Ok(Comparison::Differ(diff))
    }
}

/// Lines without their `\n` / `\r\n` terminators, matching `str::lines`.
fn byte_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let mut lines = (!bytes.is_empty()).then(|| body.split(|&b| b == b'\n'));
    std::iter::from_fn(move || lines.as_mut()?.next()).map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// Render a unified diff from `actual` to `expected`, or `None` when their lines are equal.
pub fn render_line_diff(actual: &str, expected: &str, actual_label: &str, expected_label: &str) -> Option<String> {
    if actual.lines().eq(expected.lines()) {
        return None;
    }

    let before = normalize_lines(actual);
    let after = normalize_lines(expected);
    let input = InternedInput::new(before.as_str(), after.as_str());
    let hunks = diff(Algorithm::Histogram, &input, UnifiedDiffBuilder::new(&input));

    Some(format!("--- {actual_label}\n+++ {expected_label}\n{hunks}"))
}

fn normalize_lines(text: &str) -> String {
    text.lines().flat_map(|line| [line, "\n"]).collect()
}

/// Runs an external diff tool as `<tool> <actual> <expected>`.
///
/// Exit status 0 means the files match, 1 means they differ (stdout is the diff), anything else is an error.
pub struct ExternalDiff {
    tool: CommandLine,
}

impl ExternalDiff {
    pub fn new(tool: CommandLine) -> Self {
        Self { tool }
    }
}

impl Comparator for ExternalDiff {
    fn compare(&self, actual: &Path, expected: &Path) -> Result<Comparison, HarnessError> {
        let output = self.tool.output(&[actual, expected])?;
        match output.status.code() {
            Some(0) => Ok(Comparison::Same),
            Some(1) => Ok(Comparison::Differ(String::from_utf8_lossy(&output.stdout).into_owned())),
            code => Err(HarnessError::DiffTool {
                tool: self.tool.to_string(),
                status: describe_status(code),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}
