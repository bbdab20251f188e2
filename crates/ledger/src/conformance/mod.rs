//! Conformance test suite for `Ledger` implementations.
//!
//! This module provides a backend-agnostic test suite that any `Ledger`
//! implementation can run to verify correctness. The suite covers:
//!
//! - **Snapshot isolation**: read-your-writes, uncommitted writes invisible,
//!   aborted writes discarded
//! - **Atomic commit**: all-or-nothing semantics for multi-key snapshots
//! - **Conflict detection**: stale reads rejected at commit, blind writes allowed
//! - **Queries**: committed reads, prefix listing, empty values reading as absent
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty ledger for each test:
//!
//! ```ignore
//! use trace_ledger::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn memory_conformance() {
//!     let report = run_conformance_suite(|| async { MemoryLedger::new() }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod commit;
mod conflict;
mod query;
mod snapshot;

use std::fmt;
use std::future::Future;

use crate::Ledger;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "snapshot", "commit", "conflict").
    pub category: String,
    /// Test name (e.g. "uncommitted_write_invisible").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in self.results.iter().filter(|r| !r.passed) {
            writeln!(
                f,
                "  FAIL [{}/{}]: {}",
                r.category,
                r.name,
                r.message.as_deref().unwrap_or("(no message)")
            )?;
        }
        Ok(())
    }
}

/// Run the full conformance suite against a ledger backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// ledger, ensuring test isolation.
pub async fn run_conformance_suite<L, F, Fut>(factory: F) -> ConformanceReport
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let mut results = Vec::new();

    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(commit::run_commit_tests(&factory).await);
    results.extend(conflict::run_conflict_tests(&factory).await);
    results.extend(query::run_query_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn err<E: fmt::Display>(step: &'static str) -> impl Fn(E) -> String {
    move |e| format!("{step}: {e}")
}

/// Commit `pairs` in a single snapshot.
async fn seed<L: Ledger>(ledger: &L, pairs: &[(&str, &str)]) -> Result<(), String> {
    let mut snap = ledger.begin_snapshot().await.map_err(err("begin"))?;
    for (key, value) in pairs {
        ledger
            .put_state(&mut snap, key, value.as_bytes().to_vec())
            .await
            .map_err(err("put"))?;
    }
    ledger.commit_snapshot(snap).await.map_err(err("commit"))?;
    Ok(())
}

/// Committed value at `key` as a UTF-8 string.
async fn committed<L: Ledger>(ledger: &L, key: &str) -> Result<Option<String>, String> {
    let value = ledger.read_committed(key).await.map_err(err("read"))?;
    Ok(value.map(|v| String::from_utf8_lossy(&v.value).into_owned()))
}
