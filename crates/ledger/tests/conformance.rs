//! Runs the ledger conformance suite against both shipped backends.

use trace_ledger::conformance::run_conformance_suite;
use trace_ledger::{FileLedger, MemoryLedger};

#[tokio::test]
async fn memory_ledger_conformance() {
    let report = run_conformance_suite(|| async { MemoryLedger::new() }).await;
    assert_eq!(report.failed, 0, "{report}");
    assert!(report.total > 0);
}

#[tokio::test]
async fn file_ledger_conformance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = std::sync::atomic::AtomicUsize::new(0);
    let report = run_conformance_suite(|| {
        let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let path = dir.path().join(format!("ledger-{n}.json"));
        async move { FileLedger::open(path).expect("open file ledger") }
    })
    .await;
    assert_eq!(report.failed, 0, "{report}");
}
