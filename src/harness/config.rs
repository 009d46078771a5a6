//! Harness configuration
//!
//! Defaults reproduce the classic setup: compile `BNF.java` once, run `java BNF <input> output.txt` for every fixture.

use std::path::PathBuf;

use crate::fixtures::PairingMode;

/// Shared output file the program under test writes to, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "output.txt";
pub const DEFAULT_BUILD_COMMAND: &str = "javac BNF.java";
pub const DEFAULT_PROGRAM_COMMAND: &str = "java BNF";

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Directory holding `i*` input and `o*` expected-output files
    pub fixture_dir: PathBuf,
    /// Build command line, run once before any fixture; `None` skips the build
    pub build_command: Option<String>,
    /// Program command line; the input and output paths are appended as two arguments
    pub program_command: String,
    /// File the program writes to, overwritten for every fixture
    pub output_path: PathBuf,
    /// External diff tool command line; `None` uses the built-in line diff
    pub diff_tool: Option<String>,
    pub pairing: PairingMode,
    /// Stop after the first failing fixture
    pub stop_on_fail: bool,
    /// Fail the whole run when the build command fails instead of running the fixtures anyway
    pub abort_on_build_failure: bool,
    /// Only run fixtures whose input file name contains this keyword
    pub filter: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fixture_dir: PathBuf::from("."),
            build_command: Some(DEFAULT_BUILD_COMMAND.to_string()),
            program_command: DEFAULT_PROGRAM_COMMAND.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            diff_tool: None,
            pairing: PairingMode::default(),
            stop_on_fail: false,
            abort_on_build_failure: false,
            filter: None,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixture_dir = dir.into();
        self
    }

    pub fn with_build_command(mut self, command: Option<String>) -> Self {
        self.build_command = command;
        self
    }

    pub fn with_program_command(mut self, command: impl Into<String>) -> Self {
        self.program_command = command.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_diff_tool(mut self, tool: Option<String>) -> Self {
        self.diff_tool = tool;
        self
    }

    pub fn with_pairing(mut self, pairing: PairingMode) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn with_stop_on_fail(mut self, stop: bool) -> Self {
        self.stop_on_fail = stop;
        self
    }

    pub fn with_abort_on_build_failure(mut self, abort: bool) -> Self {
        self.abort_on_build_failure = abort;
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }
}
