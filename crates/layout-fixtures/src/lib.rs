//! JSON fixture loading and golden-output comparison for `evmtrace-core`.
//!
//! Fixtures cover both the direct-slot scenarios (packed primitives,
//! structs, static arrays), where the diff's slot keys are plain integers
//! an author can write by hand, and the `keccak256`-derived scenarios
//! (mappings, dynamic arrays, long-form `bytes`/`string`), where the diff's
//! slot keys are precomputed hash digests baked into the fixture file.
//! `evmtrace-core`'s own inline unit tests cover the same derivations by
//! calling the real hash function at test time; these fixtures pin the
//! same scenarios to on-disk golden files instead.

use evmtrace_core::{CandidateKey, DecodeConfig, DecodeRequest, DecodeResult, Layout, LayoutError, Slot, StorageDiff};
use serde::Deserialize;
use std::path::Path;

/// One fixture: a decode input plus the shape of the output it must
/// produce.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub layout: Layout,
    pub diff: StorageDiff,
    #[serde(default)]
    pub candidate_keys: Vec<CandidateKey>,
    #[serde(default)]
    pub config: DecodeConfig,
    pub expect: ExpectedOutcome,
}

/// The observable shape a fixture's decode is expected to produce.
///
/// Deliberately loose (variable names and slot set, not full structural
/// equality of every record) so fixtures stay readable and don't need to
/// mirror every field the decoder happens to emit.
#[derive(Debug, Deserialize)]
pub struct ExpectedOutcome {
    /// Variable labels expected to appear in the decoded map, in the exact
    /// order they must appear (the layout's declaration order).
    pub variables: Vec<String>,
    #[serde(default)]
    pub unexplored_slots: Vec<String>,
}

/// Loads a fixture from a JSON file on disk.
pub fn load_fixture(path: &Path) -> Result<Fixture, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("failed to read fixture {path:?}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| format!("failed to parse fixture {path:?}: {e}"))
}

/// Runs a fixture's decode request through `evmtrace_core::decode`.
pub fn run_fixture(fixture: &Fixture) -> Result<DecodeResult, LayoutError> {
    let request = DecodeRequest {
        diff: &fixture.diff,
        layout: &fixture.layout,
        candidate_keys: &fixture.candidate_keys,
        config: fixture.config,
    };
    evmtrace_core::decode(&request)
}

/// Compares a decode result's shape against a fixture's expectations,
/// collecting every mismatch rather than stopping at the first one.
pub fn compare_outcome(result: &DecodeResult, expected: &ExpectedOutcome) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let actual_variables: Vec<&str> = result.decoded.keys().map(String::as_str).collect();
    if actual_variables != expected.variables {
        errors.push(format!(
            "decoded variable order mismatch: expected {:?}, got {actual_variables:?}",
            expected.variables
        ));
    }

    let expected_unexplored: Result<Vec<Slot>, _> = expected.unexplored_slots.iter().map(|s| s.parse()).collect();
    match expected_unexplored {
        Ok(mut expected_slots) => {
            expected_slots.sort();
            if result.unexplored_slots != expected_slots {
                errors.push(format!(
                    "unexplored slots mismatch: expected {expected_slots:?}, got {:?}",
                    result.unexplored_slots
                ));
            }
        }
        Err(_) => errors.push("fixture's expected unexplored_slots contains an unparseable hex slot".to_string()),
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Loads, decodes, and checks one fixture file end to end.
pub fn assert_fixture(path: &Path) -> Result<(), Vec<String>> {
    let fixture = load_fixture(path).map_err(|e| vec![e])?;
    let result = run_fixture(&fixture).map_err(|e| vec![e.to_string()])?;
    compare_outcome(&result, &fixture.expect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn testdata(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
    }

    #[test]
    fn packed_primitives_fixture_loads() {
        let fixture = load_fixture(&testdata("packed_primitives.json")).unwrap();
        assert_eq!(fixture.layout.storage.len(), 4);
    }

    #[test]
    fn missing_fixture_is_a_readable_error() {
        let err = load_fixture(&testdata("does_not_exist.json")).unwrap_err();
        assert!(err.contains("does_not_exist.json"));
    }
}
