#![forbid(unsafe_code)]
//! Fixture harness
//!
//! Builds a program once, runs it against a directory of paired input / expected-output fixture files and diffs
//! what it produced against what was expected, reporting `Test <N> completed` for every pair.
//!
//! The crate also ships the small BNF grammar expander (`bnf` binary) that the sample fixtures exercise.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli`, `fixtures` and
//!   `harness` modules enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod bnf;
pub mod cli;
pub mod fixtures;
pub mod harness;
pub mod version;

pub use fixtures::{FixtureError, FixturePair, FixtureSet, PairingMode};
pub use harness::{HarnessConfig, HarnessError, RunSummary, TestOutcome, TestRunner};
