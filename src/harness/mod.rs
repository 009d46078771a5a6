//! Fixture harness: build once, then run, compare and report each fixture pair in order
//!
//! ## Flow
//!
//! 1. Discover and pair fixtures (see [`crate::fixtures`])
//! 2. Build the program under test exactly once. A failed build is reported and the pairs still run, unless the
//!    runner is set to abort on build failure
//! 3. For every pair: clear the shared output file, run the program, compare, report
//!
//! Execution is strictly serial. Every pair writes the same output path, so pairs can never overlap.
//!
//! ## Reporting
//!
//! Reporting goes through the [`TestReporter`] trait so console and JSON output share one driver. Every processed
//! pair is reported regardless of its outcome.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod config;
pub mod interfaces;
pub mod reporter;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub use config::{DEFAULT_BUILD_COMMAND, DEFAULT_OUTPUT, DEFAULT_PROGRAM_COMMAND, HarnessConfig};
pub use interfaces::{
    BuildOutcome, Builder, CommandBuilder, CommandLine, CommandRunner, Comparator, Comparison, ExternalDiff,
    HarnessError, LineDiff, NoBuild, ProgramRunner, RunOutcome,
};
pub use reporter::{ConsoleReporter, JsonReporter, TestReporter};

use crate::fixtures::{self, FixturePair};

/// Outcome of one fixture pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    /// Program succeeded but its output differs from the expected file
    Mismatch { diff: String },
    /// Program exited unsuccessfully. `diff` holds the comparison of whatever output it left behind
    ProgramFailed {
        code: Option<i32>,
        stderr: String,
        diff: Option<String>,
    },
    /// The harness could not run or compare this pair
    Errored { message: String },
}

impl TestOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

/// Summary of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pairs that were processed (less than collected when stopped early)
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub stopped_early: bool,
    /// The build step failed but the pairs were run anyway
    pub build_failed: bool,
    pub duration: Duration,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.build_failed
    }
}

/// Sequential driver over a list of fixture pairs.
pub struct TestRunner {
    builder: Box<dyn Builder>,
    program: Box<dyn ProgramRunner>,
    comparator: Box<dyn Comparator>,
    output: PathBuf,
    stop_on_fail: bool,
    abort_on_build_failure: bool,
}

impl TestRunner {
    pub fn new(builder: Box<dyn Builder>, program: Box<dyn ProgramRunner>, comparator: Box<dyn Comparator>) -> Self {
        Self {
            builder,
            program,
            comparator,
            output: PathBuf::from(DEFAULT_OUTPUT),
            stop_on_fail: false,
            abort_on_build_failure: false,
        }
    }

    /// Wire up the process-backed collaborators described by `config`.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        let builder: Box<dyn Builder> = match &config.build_command {
            Some(line) => Box::new(CommandBuilder::new(CommandLine::parse(line)?)),
            None => Box::new(NoBuild),
        };
        let program = Box::new(CommandRunner::new(CommandLine::parse(&config.program_command)?));
        let comparator: Box<dyn Comparator> = match &config.diff_tool {
            Some(tool) => Box::new(ExternalDiff::new(CommandLine::parse(tool)?)),
            None => Box::new(LineDiff),
        };

        Ok(Self::new(builder, program, comparator)
            .with_output(config.output_path.clone())
            .with_stop_on_fail(config.stop_on_fail)
            .with_abort_on_build_failure(config.abort_on_build_failure))
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = output;
        self
    }

    pub fn with_stop_on_fail(mut self, stop: bool) -> Self {
        self.stop_on_fail = stop;
        self
    }

    /// Return the build error instead of running the pairs against a stale or missing program.
    pub fn with_abort_on_build_failure(mut self, abort: bool) -> Self {
        self.abort_on_build_failure = abort;
        self
    }

    /// Build once, then process `pairs` in order.
    pub fn run(&self, pairs: &[FixturePair], reporter: &mut dyn TestReporter) -> Result<RunSummary, HarnessError> {
        let start = Instant::now();

        let mut summary = RunSummary::default();
        match self.builder.build() {
            Ok(build) => reporter.on_build_complete(&build),
            Err(e) if self.abort_on_build_failure => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "build failed, running fixtures anyway");
                reporter.on_build_failed(&e);
                summary.build_failed = true;
            }
        }

        for pair in pairs {
            reporter.on_test_start(pair);
            let test_start = Instant::now();
            let outcome = self.run_one(pair);
            let elapsed = test_start.elapsed();

            tracing::info!(index = pair.index, input = %pair.input.display(), ?elapsed, pass = outcome.is_pass(), "fixture finished");

            summary.total += 1;
            if outcome.is_pass() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            reporter.on_test_complete(pair, &outcome, elapsed);

            if self.stop_on_fail && !outcome.is_pass() {
                summary.stopped_early = summary.total < pairs.len();
                break;
            }
        }

        summary.duration = start.elapsed();
        reporter.on_run_complete(&summary);
        Ok(summary)
    }

    fn run_one(&self, pair: &FixturePair) -> TestOutcome {
        if let Err(e) = self.clear_output() {
            return TestOutcome::Errored {
                message: format!("failed to clear '{}': {}", self.output.display(), e),
            };
        }

        let run = match self.program.run(&pair.input, &self.output) {
            Ok(run) => run,
            Err(e) => return TestOutcome::Errored { message: e.to_string() },
        };
        if !run.success {
            return TestOutcome::ProgramFailed {
                code: run.code,
                stderr: run.stderr,
                diff: self.partial_diff(pair),
            };
        }

        match self.comparator.compare(&self.output, &pair.expected) {
            Ok(Comparison::Same) => TestOutcome::Passed,
            Ok(Comparison::Differ(diff)) => TestOutcome::Mismatch { diff },
            Err(e) => TestOutcome::Errored { message: e.to_string() },
        }
    }

    /// Diff of the output a failed program left behind, if it wrote any and it differs.
    fn partial_diff(&self, pair: &FixturePair) -> Option<String> {
        if !self.output.exists() {
            return None;
        }
        match self.comparator.compare(&self.output, &pair.expected) {
            Ok(Comparison::Differ(diff)) => Some(diff),
            Ok(Comparison::Same) => None,
            Err(e) => {
                tracing::debug!(index = pair.index, error = %e, "could not diff partial output");
                None
            }
        }
    }

    /// Remove the previous pair's output so a silent program cannot pass on stale data.
    fn clear_output(&self) -> io::Result<()> {
        match fs::remove_file(&self.output) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Discover, pair and filter fixtures per `config`, then run them.
pub fn run_harness(config: &HarnessConfig, reporter: &mut dyn TestReporter) -> Result<RunSummary, HarnessError> {
    let set = fixtures::discover(&config.fixture_dir)?;
    let mut pairs = set.pairs(config.pairing)?;
    if let Some(keyword) = &config.filter {
        pairs = fixtures::filter_pairs(pairs, keyword);
    }
    reporter.on_collection_complete(&pairs);

    TestRunner::from_config(config)?.run(&pairs, reporter)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    /// Records every collaborator call in order.
    #[derive(Clone, Default)]
    struct Journal(Rc<RefCell<Vec<String>>>);

    impl Journal {
        fn push(&self, entry: String) {
            self.0.borrow_mut().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    struct FakeBuilder {
        journal: Journal,
        fail: bool,
    }

    impl Builder for FakeBuilder {
        fn build(&self) -> Result<BuildOutcome, HarnessError> {
            self.journal.push("build".to_string());
            if self.fail {
                return Err(HarnessError::BuildFailed {
                    status: "exit code 1".to_string(),
                    output: "BNF.java:1: error".to_string(),
                });
            }
            Ok(BuildOutcome::default())
        }
    }

    /// Copies the input file to the output, except inputs containing "crash". Crashing inputs leave the first
    /// line of the input behind as partial output.
    struct CopyProgram {
        journal: Journal,
    }

    impl ProgramRunner for CopyProgram {
        fn run(&self, input: &Path, output: &Path) -> Result<RunOutcome, HarnessError> {
            let name = input.file_name().unwrap().to_string_lossy().to_string();
            self.journal.push(format!("run {name}"));
            if name.contains("crash") {
                let text = fs::read_to_string(input)?;
                fs::write(output, text.lines().next().unwrap_or_default())?;
                return Ok(RunOutcome {
                    success: false,
                    code: Some(1),
                    stderr: "Exception in thread \"main\"".to_string(),
                });
            }
            fs::copy(input, output)?;
            Ok(RunOutcome {
                success: true,
                code: Some(0),
                stderr: String::new(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        completed: Vec<(usize, TestOutcome)>,
        summary: Option<RunSummary>,
    }

    impl TestReporter for RecordingReporter {
        fn on_test_complete(&mut self, pair: &FixturePair, outcome: &TestOutcome, _elapsed: Duration) {
            self.completed.push((pair.index, outcome.clone()));
        }

        fn on_run_complete(&mut self, summary: &RunSummary) {
            self.summary = Some(summary.clone());
        }
    }

    #[derive(Default)]
    struct BuildRecorder {
        failures: Vec<String>,
        completed: usize,
    }

    impl TestReporter for BuildRecorder {
        fn on_build_failed(&mut self, error: &HarnessError) {
            self.failures.push(error.to_string());
        }

        fn on_test_complete(&mut self, _pair: &FixturePair, _outcome: &TestOutcome, _elapsed: Duration) {
            self.completed += 1;
        }

        fn on_run_complete(&mut self, _summary: &RunSummary) {}
    }

    fn runner(journal: &Journal, fail_build: bool, output: PathBuf) -> TestRunner {
        TestRunner::new(
            Box::new(FakeBuilder {
                journal: journal.clone(),
                fail: fail_build,
            }),
            Box::new(CopyProgram {
                journal: journal.clone(),
            }),
            Box::new(LineDiff),
        )
        .with_output(output)
    }

    fn pair(dir: &Path, index: usize, input: &str, input_text: &str, expected_text: &str) -> FixturePair {
        let expected = format!("o{index}.txt");
        fs::write(dir.join(input), input_text).unwrap();
        fs::write(dir.join(&expected), expected_text).unwrap();
        FixturePair {
            index,
            key: index.to_string(),
            input: dir.join(input),
            expected: dir.join(expected),
        }
    }

    #[test]
    fn test_build_runs_once_before_any_pair() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let pairs = vec![
            pair(dir.path(), 1, "i1.txt", "a", "a"),
            pair(dir.path(), 2, "i2.txt", "b", "b"),
        ];

        let mut reporter = RecordingReporter::default();
        let summary = runner(&journal, false, dir.path().join("output.txt"))
            .run(&pairs, &mut reporter)
            .unwrap();

        assert_eq!(journal.entries(), vec!["build", "run i1.txt", "run i2.txt"]);
        assert_eq!(summary.passed, 2);
        assert!(summary.is_success());
    }

    #[test]
    fn test_build_runs_even_without_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let mut reporter = RecordingReporter::default();
        let summary = runner(&journal, false, dir.path().join("output.txt"))
            .run(&[], &mut reporter)
            .unwrap();
        assert_eq!(journal.entries(), vec!["build"]);
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn test_build_failure_aborts_before_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let pairs = vec![pair(dir.path(), 1, "i1.txt", "a", "a")];

        let mut reporter = RecordingReporter::default();
        let err = runner(&journal, true, dir.path().join("output.txt"))
            .with_abort_on_build_failure(true)
            .run(&pairs, &mut reporter)
            .unwrap_err();

        assert!(matches!(err, HarnessError::BuildFailed { .. }));
        assert_eq!(journal.entries(), vec!["build"]);
        assert!(reporter.completed.is_empty());
    }

    #[test]
    fn test_failed_build_still_runs_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let pairs = vec![
            pair(dir.path(), 1, "i1.txt", "a", "a"),
            pair(dir.path(), 2, "i2.txt", "b", "b"),
        ];

        let mut reporter = BuildRecorder::default();
        let summary = runner(&journal, true, dir.path().join("output.txt"))
            .run(&pairs, &mut reporter)
            .unwrap();

        assert_eq!(journal.entries(), vec!["build", "run i1.txt", "run i2.txt"]);
        assert_eq!(reporter.completed, 2);
        assert_eq!(reporter.failures.len(), 1);
        assert!(reporter.failures[0].starts_with("build failed"));
        assert_eq!(summary.passed, 2);
        assert!(summary.build_failed);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_every_pair_reported_regardless_of_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let pairs = vec![
            pair(dir.path(), 1, "i1.txt", "same", "same"),
            pair(dir.path(), 2, "i2.txt", "actual", "expected"),
            pair(dir.path(), 3, "i3_crash.txt", "x", "x"),
            pair(dir.path(), 4, "i4_crash.txt", "half\nrest", "full\nrest"),
        ];

        let mut reporter = RecordingReporter::default();
        let summary = runner(&journal, false, dir.path().join("output.txt"))
            .run(&pairs, &mut reporter)
            .unwrap();

        let indices: Vec<usize> = reporter.completed.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(reporter.completed[0].1, TestOutcome::Passed);
        assert!(matches!(&reporter.completed[1].1, TestOutcome::Mismatch { diff } if diff.contains("+expected")));
        // Partial output that matches the expected file has nothing to show
        assert!(matches!(
            reporter.completed[2].1,
            TestOutcome::ProgramFailed {
                code: Some(1),
                diff: None,
                ..
            }
        ));
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 3);
        assert!(!summary.is_success());
        assert_eq!(reporter.summary, Some(summary));
    }

    #[test]
    fn test_failed_program_partial_output_is_diffed() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let pairs = vec![pair(dir.path(), 1, "i1_crash.txt", "half\nrest", "full\nrest")];

        let mut reporter = RecordingReporter::default();
        runner(&journal, false, dir.path().join("output.txt"))
            .run(&pairs, &mut reporter)
            .unwrap();

        match &reporter.completed[0].1 {
            TestOutcome::ProgramFailed { diff: Some(diff), .. } => {
                assert!(diff.contains("-half"));
                assert!(diff.contains("+full"));
                assert!(diff.contains("+rest"));
            }
            other => panic!("expected a failed program with a diff, got {other:?}"),
        }
    }

    #[test]
    fn test_stop_on_fail() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let pairs = vec![
            pair(dir.path(), 1, "i1.txt", "actual", "expected"),
            pair(dir.path(), 2, "i2.txt", "b", "b"),
        ];

        let mut reporter = RecordingReporter::default();
        let summary = runner(&journal, false, dir.path().join("output.txt"))
            .with_stop_on_fail(true)
            .run(&pairs, &mut reporter)
            .unwrap();

        assert_eq!(summary.total, 1);
        assert!(summary.stopped_early);
        assert_eq!(journal.entries(), vec!["build", "run i1.txt"]);
    }

    #[test]
    fn test_stale_output_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output.txt");
        fs::write(&output, "stale").unwrap();

        /// Succeeds without writing anything.
        struct Silent;
        impl ProgramRunner for Silent {
            fn run(&self, _input: &Path, _output: &Path) -> Result<RunOutcome, HarnessError> {
                Ok(RunOutcome {
                    success: true,
                    code: Some(0),
                    stderr: String::new(),
                })
            }
        }

        let pairs = vec![pair(dir.path(), 1, "i1.txt", "stale", "stale")];
        let runner = TestRunner::new(Box::new(NoBuild), Box::new(Silent), Box::new(LineDiff)).with_output(output);
        let mut reporter = RecordingReporter::default();
        runner.run(&pairs, &mut reporter).unwrap();

        assert!(matches!(reporter.completed[0].1, TestOutcome::Errored { .. }));
    }

    #[test]
    fn test_run_harness_reports_fixture_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("input1.txt"), "").unwrap();

        let config = HarnessConfig::new()
            .with_fixture_dir(dir.path())
            .with_build_command(None)
            .with_pairing(fixtures::PairingMode::Keyed);
        let mut reporter = RecordingReporter::default();
        let err = run_harness(&config, &mut reporter).unwrap_err();
        assert!(matches!(err, HarnessError::Fixtures(_)));
    }
}
