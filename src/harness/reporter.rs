//! Test reporters
//!
//! [`ConsoleReporter`] keeps the classic console contract: any diff text for a pair is written to stdout, followed by
//! `Test <N> completed`, for every pair whatever its outcome. Status lines and the summary go to stderr.
//!
//! [`JsonReporter`] writes one JSON object per event, one per line.

use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;

use super::interfaces::{BuildOutcome, HarnessError};
use super::{RunSummary, TestOutcome};
use crate::fixtures::FixturePair;
use crate::version::HARNESS_VERSION;

/// Trait for reporting harness progress.
///
/// Implement this trait to customize output format.
pub trait TestReporter {
    /// Called once pairing (and filtering) is done, before the build
    fn on_collection_complete(&mut self, _pairs: &[FixturePair]) {}

    /// Called after a successful build
    fn on_build_complete(&mut self, _build: &BuildOutcome) {}

    /// Called when the build fails and the pairs are run anyway
    fn on_build_failed(&mut self, _error: &HarnessError) {}

    fn on_test_start(&mut self, _pair: &FixturePair) {}

    /// Called for every processed pair, in order
    fn on_test_complete(&mut self, pair: &FixturePair, outcome: &TestOutcome, elapsed: Duration);

    fn on_run_complete(&mut self, summary: &RunSummary);
}

// ============================================================================
// Console
// ============================================================================

/// Console reporter.
pub struct ConsoleReporter<O: Write = io::Stdout, E: Write = io::Stderr> {
    pub verbose: bool,
    out: O,
    err: E,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self::with_writers(verbose, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn with_writers(verbose: bool, out: O, err: E) -> Self {
        Self { verbose, out, err }
    }

    /// Recover the writers, e.g. to inspect captured output.
    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    fn write_diff(&mut self, diff: &str) {
        let _ = write!(self.out, "{diff}");
        if !diff.is_empty() && !diff.ends_with('\n') {
            let _ = writeln!(self.out);
        }
    }
}

fn status_label(outcome: &TestOutcome, elapsed: Duration) -> String {
    match outcome {
        TestOutcome::Passed => format!("\x1b[32mPASSED\x1b[0m ({}ms)", elapsed.as_millis()),
        TestOutcome::Mismatch { .. } => format!("\x1b[31mFAILED\x1b[0m ({}ms)", elapsed.as_millis()),
        TestOutcome::ProgramFailed { code: Some(code), .. } => format!("\x1b[31mCRASHED\x1b[0m (exit code {code})"),
        TestOutcome::ProgramFailed { code: None, .. } => "\x1b[31mCRASHED\x1b[0m (signal)".to_string(),
        TestOutcome::Errored { .. } => "\x1b[31mERROR\x1b[0m".to_string(),
    }
}

impl<O: Write, E: Write> TestReporter for ConsoleReporter<O, E> {
    fn on_collection_complete(&mut self, pairs: &[FixturePair]) {
        if pairs.is_empty() {
            let _ = writeln!(self.err, "No tests collected");
        } else if self.verbose {
            let _ = writeln!(self.err, "collected {} item(s)", pairs.len());
        }
    }

    fn on_build_complete(&mut self, build: &BuildOutcome) {
        if self.verbose && !build.output.is_empty() {
            let _ = write!(self.err, "{}", build.output);
        }
    }

    fn on_build_failed(&mut self, error: &HarnessError) {
        let _ = writeln!(self.err, "Build failed: {}", error.to_string().trim_end());
    }

    fn on_test_complete(&mut self, pair: &FixturePair, outcome: &TestOutcome, elapsed: Duration) {
        match outcome {
            TestOutcome::Passed => {}
            TestOutcome::Mismatch { diff } => self.write_diff(diff),
            TestOutcome::ProgramFailed { stderr, diff, .. } => {
                let _ = writeln!(self.err, "{}: program failed", pair.input.display());
                if !stderr.is_empty() {
                    let _ = writeln!(self.err, "{}", stderr.trim_end());
                }
                if let Some(diff) = diff {
                    self.write_diff(diff);
                }
            }
            TestOutcome::Errored { message } => {
                let _ = writeln!(self.err, "{}: {}", pair.input.display(), message);
            }
        }

        if self.verbose {
            let _ = writeln!(self.err, "{} {}", pair.input_name(), status_label(outcome, elapsed));
        }

        let _ = writeln!(self.out, "Test {} completed", pair.index);
        let _ = self.out.flush();
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        if summary.total == 0 {
            return;
        }

        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("{} passed", summary.passed));
        }
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed));
        }
        let color = if summary.is_success() { "\x1b[1;32m" } else { "\x1b[1;31m" };

        let _ = writeln!(
            self.err,
            "{}====== {} in {:.2}s ======\x1b[0m",
            color,
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
        if summary.stopped_early {
            let _ = writeln!(self.err, "stopped after first failure");
        }
        if summary.build_failed {
            let _ = writeln!(self.err, "build failed; results may come from a stale program");
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Collected {
        version: &'a str,
        count: usize,
    },
    BuildFailed {
        error: String,
    },
    Test {
        index: usize,
        key: &'a str,
        input: String,
        expected: String,
        outcome: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        diff: Option<&'a str>,
        duration_ms: u128,
    },
    Summary {
        total: usize,
        passed: usize,
        failed: usize,
        stopped_early: bool,
        build_failed: bool,
        duration_ms: u128,
    },
}

/// Newline-delimited JSON reporter.
pub struct JsonReporter<W: Write = io::Stdout> {
    out: W,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn emit(&mut self, event: &Event<'_>) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let _ = writeln!(self.out, "{line}");
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize report event"),
        }
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_collection_complete(&mut self, pairs: &[FixturePair]) {
        self.emit(&Event::Collected {
            version: HARNESS_VERSION,
            count: pairs.len(),
        });
    }

    fn on_build_failed(&mut self, error: &HarnessError) {
        self.emit(&Event::BuildFailed {
            error: error.to_string(),
        });
    }

    fn on_test_complete(&mut self, pair: &FixturePair, outcome: &TestOutcome, elapsed: Duration) {
        let (label, detail, exit_code, diff) = match outcome {
            TestOutcome::Passed => ("passed", None, None, None),
            TestOutcome::Mismatch { diff } => ("mismatch", Some(diff.as_str()), None, None),
            TestOutcome::ProgramFailed { code, stderr, diff } => {
                ("program_failed", Some(stderr.as_str()), *code, diff.as_deref())
            }
            TestOutcome::Errored { message } => ("error", Some(message.as_str()), None, None),
        };

        self.emit(&Event::Test {
            index: pair.index,
            key: &pair.key,
            input: pair.input.display().to_string(),
            expected: pair.expected.display().to_string(),
            outcome: label,
            detail,
            exit_code,
            diff,
            duration_ms: elapsed.as_millis(),
        });
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.emit(&Event::Summary {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            stopped_early: summary.stopped_early,
            build_failed: summary.build_failed,
            duration_ms: summary.duration.as_millis(),
        });
        let _ = self.out.flush();
    }
}
