//! Named end-to-end scenarios with expected results.
//!
//! Each vector describes both memberships, which users the directory does
//! not know, and the counts a run must report. The vectors are run
//! against [`MemoryDirectory`](listsync_engine::MemoryDirectory) through
//! static sources.

use listsync_core::{SyncMode, SyncResult};
use tokio_util::sync::CancellationToken;

use crate::fixtures::SyncFixture;

/// A scenario vector.
#[derive(Debug, Clone)]
pub struct ScenarioVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Source membership.
    pub source: &'static [&'static str],
    /// Destination membership (seeded into the target collection).
    pub destination: &'static [&'static str],
    /// Sync mode.
    pub mode: SyncMode,
    /// Source users the directory cannot resolve.
    pub unknown: &'static [&'static str],
    /// Expected counts.
    pub expected_added: usize,
    pub expected_removed: usize,
    pub expected_errors: usize,
}

/// Get all scenario vectors.
pub fn all_scenarios() -> Vec<ScenarioVector> {
    vec![
        ScenarioVector {
            name: "full sync adds one and removes one",
            source: &["a", "b", "c"],
            destination: &["b", "c", "d"],
            mode: SyncMode::Full,
            unknown: &[],
            expected_added: 1,
            expected_removed: 1,
            expected_errors: 0,
        },
        ScenarioVector {
            name: "both empty short-circuits",
            source: &[],
            destination: &[],
            mode: SyncMode::Full,
            unknown: &[],
            expected_added: 0,
            expected_removed: 0,
            expected_errors: 0,
        },
        ScenarioVector {
            name: "add mode leaves extras alone",
            source: &["a", "b"],
            destination: &["b", "x", "y"],
            mode: SyncMode::Add,
            unknown: &[],
            expected_added: 1,
            expected_removed: 0,
            expected_errors: 0,
        },
        ScenarioVector {
            name: "remove mode leaves missing alone",
            source: &["a", "b"],
            destination: &["b", "x", "y"],
            mode: SyncMode::Remove,
            unknown: &[],
            expected_added: 0,
            expected_removed: 2,
            expected_errors: 0,
        },
        ScenarioVector {
            name: "case differences are not changes",
            source: &["Alice", "BOB"],
            destination: &["alice", "bob"],
            mode: SyncMode::Full,
            unknown: &[],
            expected_added: 0,
            expected_removed: 0,
            expected_errors: 0,
        },
        ScenarioVector {
            name: "empty destination is an all-add plan",
            source: &["a", "b", "c"],
            destination: &[],
            mode: SyncMode::Full,
            unknown: &[],
            expected_added: 3,
            expected_removed: 0,
            expected_errors: 0,
        },
        ScenarioVector {
            name: "empty source is an all-remove plan",
            source: &[],
            destination: &["a", "b"],
            mode: SyncMode::Full,
            unknown: &[],
            expected_added: 0,
            expected_removed: 2,
            expected_errors: 0,
        },
        ScenarioVector {
            name: "unknown users fail without stopping the run",
            source: &["ghost", "a", "phantom"],
            destination: &["z"],
            mode: SyncMode::Full,
            unknown: &["ghost", "phantom"],
            expected_added: 1,
            expected_removed: 1,
            expected_errors: 2,
        },
    ]
}

/// Run a vector against a fresh fixture.
pub async fn run_scenario(vector: &ScenarioVector) -> (SyncFixture, SyncResult) {
    let fixture = SyncFixture::with_members(&[], vector.destination, vector.mode);
    fixture.directory.register_all(
        vector
            .source
            .iter()
            .copied()
            .filter(|key| !vector.unknown.contains(key)),
    );

    let source = fixture.static_source("source", vector.source);
    let destination = fixture.static_source("destination", vector.destination);
    let result = fixture
        .orchestrator()
        .run(&source, &destination, &fixture.target, &CancellationToken::new())
        .await;

    (fixture, result)
}

/// Check a result against a vector's expected counts.
pub fn matches(vector: &ScenarioVector, result: &SyncResult) -> bool {
    result.added_count == vector.expected_added
        && result.removed_count == vector.expected_removed
        && result.error_count == vector.expected_errors
}

/// Run every vector; returns `(name, passed)` per vector.
pub async fn verify_all_scenarios() -> Vec<(String, bool)> {
    let mut report = Vec::new();
    for vector in all_scenarios() {
        let (_, result) = run_scenario(&vector).await;
        report.push((vector.name.to_string(), matches(&vector, &result)));
    }
    report
}
