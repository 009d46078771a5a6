//! Property-based tests for fixture discovery and pairing
//!
//! These tests use proptest to build random fixture directories and check the pairing invariants hold.

use std::collections::BTreeSet;
use std::fs;

use fixture_harness::fixtures::{self, PairingMode};
use proptest::prelude::*;

fn write_dir(names: &[String]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in names {
        fs::write(dir.path().join(name), "").expect("write fixture");
    }
    dir
}

// Strategy for file names that are never fixtures
fn noise_name() -> impl Strategy<Value = String> {
    "[a-hj-np-z][a-z0-9]{0,6}\\.(md|txt|java)"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: positional pairing processes exactly min(inputs, outputs) pairs, numbered 1..=n
    #[test]
    fn positional_pairs_truncate_to_shorter_side(
        inputs in prop::collection::btree_set(0u32..500, 0..8),
        outputs in prop::collection::btree_set(0u32..500, 0..8),
    ) {
        let mut names: Vec<String> = inputs.iter().map(|n| format!("input{n}.txt")).collect();
        names.extend(outputs.iter().map(|n| format!("output{n}.txt")));
        let dir = write_dir(&names);

        let pairs = fixtures::discover(dir.path()).unwrap().pairs(PairingMode::Positional).unwrap();
        prop_assert_eq!(pairs.len(), inputs.len().min(outputs.len()));
        for (i, pair) in pairs.iter().enumerate() {
            prop_assert_eq!(pair.index, i + 1);
        }
    }

    /// Property: keyed pairing matches every input with the output carrying the same key
    #[test]
    fn keyed_pairs_share_keys(keys in prop::collection::btree_set(0u32..10_000, 1..10)) {
        let mut names: Vec<String> = keys.iter().map(|n| format!("input{n}.txt")).collect();
        names.extend(keys.iter().map(|n| format!("output{n}.txt")));
        let dir = write_dir(&names);

        let pairs = fixtures::discover(dir.path()).unwrap().pairs(PairingMode::Keyed).unwrap();
        prop_assert_eq!(pairs.len(), keys.len());
        for pair in &pairs {
            let expected_name = format!("output{}.txt", pair.key);
            prop_assert_eq!(pair.expected.file_name().unwrap().to_str().unwrap(), expected_name.as_str());
        }
    }

    /// Property: files not starting with `i` or `o` never reach either sequence
    #[test]
    fn noise_files_are_ignored(noise in prop::collection::btree_set(noise_name(), 0..6), count in 0usize..4) {
        let mut names: Vec<String> = noise.iter().cloned().collect();
        for n in 0..count {
            names.push(format!("input{n}.txt"));
            names.push(format!("output{n}.txt"));
        }
        let dir = write_dir(&names);

        let set = fixtures::discover(dir.path()).unwrap();
        prop_assert_eq!(set.inputs.len(), count);
        prop_assert_eq!(set.outputs.len(), count);
        let seen: BTreeSet<&String> = set.inputs.iter().chain(&set.outputs).collect();
        for name in &noise {
            prop_assert!(!seen.contains(name));
        }
    }
}
