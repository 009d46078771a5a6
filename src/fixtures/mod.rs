//! Fixture discovery and pairing
//!
//! A fixture directory holds input files (names starting with `i`) and expected-output files (names starting with
//! `o`). Everything else in the directory is ignored.
//!
//! ## Pairing
//!
//! - [`PairingMode::Positional`] (default): both sequences are sorted independently and paired by index. Extra files on the
//!   longer side are dropped with a warning.
//! - [`PairingMode::Keyed`]: files are paired by the part of their stem after the role prefix (`input3.txt` and
//!   `output3.txt` share the key `3`). Any file without a partner is an error.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while discovering or pairing fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture directory '{}': {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture '{name}' has no matching {missing} file (key '{key}')")]
    Unmatched { name: String, key: String, missing: FixtureRole },

    #[error("fixture key '{key}' is shared by '{first}' and '{second}'")]
    DuplicateKey { key: String, first: String, second: String },
}

/// Which side of a pair a fixture file is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureRole {
    Input,
    Output,
}

impl FixtureRole {
    /// Classify a file name by its first character.
    pub fn of(name: &str) -> Option<Self> {
        match name.chars().next() {
            Some('i') => Some(FixtureRole::Input),
            Some('o') => Some(FixtureRole::Output),
            _ => None,
        }
    }

    fn prefix_word(self) -> &'static str {
        match self {
            FixtureRole::Input => "input",
            FixtureRole::Output => "output",
        }
    }

    fn prefix_char(self) -> char {
        match self {
            FixtureRole::Input => 'i',
            FixtureRole::Output => 'o',
        }
    }
}

impl fmt::Display for FixtureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix_word())
    }
}

/// How inputs are associated with expected outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PairingMode {
    /// Pair the i-th sorted input with the i-th sorted output; extras are dropped
    #[default]
    Positional,
    /// Pair by the file-name key shared by both sides; unmatched files are an error
    Keyed,
}

/// One input file and the output it is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePair {
    /// 1-based position in the run
    pub index: usize,
    pub key: String,
    pub input: PathBuf,
    pub expected: PathBuf,
}

impl FixturePair {
    /// File name of the input side, for display and filtering.
    pub fn input_name(&self) -> &str {
        self.input.file_name().and_then(|n| n.to_str()).unwrap_or("")
    }
}

/// Input and expected-output file names found in one directory, each sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureSet {
    pub dir: PathBuf,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// List `dir` (non-recursively) and split its files into inputs and expected outputs.
pub fn discover(dir: &Path) -> Result<FixtureSet, FixtureError> {
    let read_err = |source: std::io::Error| FixtureError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut set = FixtureSet {
        dir: dir.to_path_buf(),
        ..FixtureSet::default()
    };

    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        match FixtureRole::of(&name) {
            Some(FixtureRole::Input) => set.inputs.push(name),
            Some(FixtureRole::Output) => set.outputs.push(name),
            None => tracing::trace!(%name, "ignoring non-fixture file"),
        }
    }

    set.inputs.sort();
    set.outputs.sort();

    tracing::debug!(
        dir = %dir.display(),
        inputs = set.inputs.len(),
        outputs = set.outputs.len(),
        "discovered fixtures"
    );
    Ok(set)
}

/// Key used to pair a fixture file with its partner: the file stem without its role prefix.
///
/// The full word (`input` / `output`) is stripped when present, otherwise just the leading `i` / `o`.
pub fn fixture_key(name: &str, role: FixtureRole) -> String {
    let stem = Path::new(name).file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    stem.strip_prefix(role.prefix_word())
        .or_else(|| stem.strip_prefix(role.prefix_char()))
        .unwrap_or(stem)
        .to_string()
}

impl FixtureSet {
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// Associate inputs with expected outputs according to `mode`.
    pub fn pairs(&self, mode: PairingMode) -> Result<Vec<FixturePair>, FixtureError> {
        match mode {
            PairingMode::Positional => Ok(self.positional_pairs()),
            PairingMode::Keyed => self.keyed_pairs(),
        }
    }

    fn pair(&self, index: usize, input: &str, expected: &str) -> FixturePair {
        FixturePair {
            index,
            key: fixture_key(input, FixtureRole::Input),
            input: self.dir.join(input),
            expected: self.dir.join(expected),
        }
    }

    fn positional_pairs(&self) -> Vec<FixturePair> {
        if self.inputs.len() != self.outputs.len() {
            tracing::warn!(
                inputs = self.inputs.len(),
                outputs = self.outputs.len(),
                dropped = self.inputs.len().abs_diff(self.outputs.len()),
                "fixture counts differ; extra files are not run"
            );
        }

        self.inputs
            .iter()
            .zip(&self.outputs)
            .enumerate()
            .map(|(i, (input, expected))| self.pair(i + 1, input, expected))
            .collect()
    }

    fn keyed_pairs(&self) -> Result<Vec<FixturePair>, FixtureError> {
        let mut outputs_by_key: HashMap<String, &str> = HashMap::new();
        for name in &self.outputs {
            let key = fixture_key(name, FixtureRole::Output);
            if let Some(first) = outputs_by_key.insert(key.clone(), name) {
                return Err(FixtureError::DuplicateKey {
                    key,
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
        }

        let mut seen_inputs: HashMap<String, &str> = HashMap::new();
        let mut pairs = Vec::with_capacity(self.inputs.len());
        for name in &self.inputs {
            let key = fixture_key(name, FixtureRole::Input);
            if let Some(first) = seen_inputs.insert(key.clone(), name) {
                return Err(FixtureError::DuplicateKey {
                    key,
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
            let Some(expected) = outputs_by_key.remove(&key) else {
                return Err(FixtureError::Unmatched {
                    name: name.clone(),
                    key,
                    missing: FixtureRole::Output,
                });
            };
            pairs.push(self.pair(pairs.len() + 1, name, expected));
        }

        // Report the first leftover output by name so the error is stable
        if let Some((key, name)) = outputs_by_key.into_iter().min_by(|a, b| a.1.cmp(b.1)) {
            return Err(FixtureError::Unmatched {
                name: name.to_string(),
                key,
                missing: FixtureRole::Input,
            });
        }

        Ok(pairs)
    }
}

/// Keep pairs whose input file name contains `keyword`, renumbering them from 1.
pub fn filter_pairs(pairs: Vec<FixturePair>, keyword: &str) -> Vec<FixturePair> {
    pairs
        .into_iter()
        .filter(|p| p.input_name().contains(keyword))
        .enumerate()
        .map(|(i, mut p)| {
            p.index = i + 1;
            p
        })
        .collect()
}
