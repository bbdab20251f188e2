//! CLI integration tests for all subcommands.
//!
//! Uses `assert_cmd` to spawn the `trace` binary and verify
//! exit codes, stdout content, and stderr content.
//!
//! Every test runs in its own temporary directory so that the default
//! ledger file and `trace.toml` lookup never touch the source tree.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper: create a Command for the `trace` binary, rooted at `dir`.
fn trace(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("trace");
    cmd.current_dir(dir.path());
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("TRACE_API_KEY");
    cmd
}

/// Helper: a temp dir with an initialized ledger at the default path.
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    trace(&dir).arg("init").assert().success();
    dir
}

fn supplier_invoke(dir: &TempDir, args: &[&str]) -> assert_cmd::assert::Assert {
    trace(dir)
        .arg("invoke")
        .args(args)
        .args(["--affiliation", "Supplier"])
        .args(["--permissions", "manufacture_inspect_ship"])
        .assert()
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let dir = TempDir::new().unwrap();
    trace(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Product traceability ledger"));
}

#[test]
fn version_exits_0() {
    let dir = TempDir::new().unwrap();
    trace(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("trace"));
}

// ──────────────────────────────────────────────
// 2. Init
// ──────────────────────────────────────────────

#[test]
fn init_creates_ledger_file() {
    let dir = TempDir::new().unwrap();
    trace(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized"));
    let content = fs::read_to_string(dir.path().join("trace-ledger.json")).unwrap();
    assert!(content.contains("productIDs"));
}

#[test]
fn init_twice_succeeds() {
    let dir = initialized();
    trace(&dir).arg("init").assert().success();
}

#[test]
fn ledger_flag_overrides_default_path() {
    let dir = TempDir::new().unwrap();
    trace(&dir)
        .args(["--ledger", "custom.json", "init"])
        .assert()
        .success();
    assert!(dir.path().join("custom.json").exists());
    assert!(!dir.path().join("trace-ledger.json").exists());
}

#[test]
fn config_file_sets_ledger_path() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("trace.toml"),
        "[ledger]\npath = \"from-config.json\"\n",
    )
    .unwrap();
    trace(&dir).arg("init").assert().success();
    assert!(dir.path().join("from-config.json").exists());
}

#[test]
fn malformed_config_exits_1() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("trace.toml"), "[ledger\n").unwrap();
    trace(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse"));
}

// ──────────────────────────────────────────────
// 3. Invoke
// ──────────────────────────────────────────────

#[test]
fn create_and_update_product() {
    let dir = initialized();
    supplier_invoke(&dir, &["createProduct", "ABC123"])
        .success()
        .stdout(predicate::str::contains("ABC123: manufactured"));
    supplier_invoke(&dir, &["updateProductState", "ABC123", "inspect"])
        .success()
        .stdout(predicate::str::contains("ABC123: inspected"))
        .stdout(predicate::str::contains("manufactured"));
}

#[test]
fn invoke_json_output_is_the_record() {
    let dir = initialized();
    let output = trace(&dir)
        .args(["--output", "json", "invoke", "createProduct", "J1"])
        .args(["--affiliation", "Supplier", "--permissions", "manufacture"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["productId"], "J1");
    assert_eq!(record["state"], "manufactured");
    assert!(record["history"]["manufactured"].is_string());
}

#[test]
fn wrong_affiliation_is_unauthorized() {
    let dir = initialized();
    supplier_invoke(&dir, &["createProduct", "ABC123"]).success();
    trace(&dir)
        .args(["invoke", "updateProductState", "ABC123", "ship"])
        .args(["--affiliation", "Retailer", "--permissions", "ship"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized"));
}

#[test]
fn out_of_order_transition_is_illegal() {
    let dir = initialized();
    supplier_invoke(&dir, &["createProduct", "ABC123"]).success();
    trace(&dir)
        .args(["invoke", "updateProductState", "ABC123", "receive"])
        .args(["--affiliation", "Retailer", "--permissions", "receive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IllegalTransition"));
}

#[test]
fn duplicate_create_exits_1() {
    let dir = initialized();
    supplier_invoke(&dir, &["createProduct", "D1"]).success();
    supplier_invoke(&dir, &["createProduct", "D1"])
        .failure()
        .stderr(predicate::str::contains("DuplicateProduct"));
}

#[test]
fn unknown_operation_exits_1() {
    let dir = initialized();
    trace(&dir)
        .args(["invoke", "deleteProduct", "X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnrecognizedOperation"));
}

#[test]
fn json_failure_is_structured() {
    let dir = initialized();
    let output = trace(&dir)
        .args(["--output", "json", "invoke", "createProduct"])
        .args(["--affiliation", "Supplier", "--permissions", "manufacture"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .find(|l| l.starts_with('{'))
        .expect("json error line");
    let json: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(json["error"]["kind"], "ArityError");
    assert_eq!(json["error"]["invariantViolation"], false);
}

#[test]
fn create_before_init_fails() {
    let dir = TempDir::new().unwrap();
    supplier_invoke(&dir, &["createProduct", "A"])
        .failure()
        .stderr(predicate::str::contains("IndexNotInitialized"));
}

// ──────────────────────────────────────────────
// 4. Query
// ──────────────────────────────────────────────

#[test]
fn query_prints_stored_record() {
    let dir = initialized();
    supplier_invoke(&dir, &["createProduct", "Q1"]).success();
    trace(&dir)
        .args(["query", "product_Q1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"productId\":\"Q1\""));
    trace(&dir)
        .args(["query", "productIDs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[\"product_Q1\"]"));
}

#[test]
fn query_missing_key_exits_1() {
    let dir = initialized();
    trace(&dir)
        .args(["query", "product_none"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

// ──────────────────────────────────────────────
// 5. Lifecycle and verify
// ──────────────────────────────────────────────

#[test]
fn lifecycle_lists_edges() {
    let dir = TempDir::new().unwrap();
    trace(&dir)
        .arg("lifecycle")
        .assert()
        .success()
        .stdout(predicate::str::contains("initial: manufactured"))
        .stdout(predicate::str::contains("--receive-->"))
        .stdout(predicate::str::contains("(Retailer)"));
}

#[test]
fn lifecycle_json() {
    let dir = TempDir::new().unwrap();
    let output = trace(&dir)
        .args(["--output", "json", "lifecycle"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["initial"], "manufactured");
    assert_eq!(json["edges"].as_array().unwrap().len(), 5);
    assert_eq!(json["edges"][4]["transition"], "sell");
    assert_eq!(json["edges"][4]["role"], "Retailer");
}

#[test]
fn verify_consistent_ledger() {
    let dir = initialized();
    supplier_invoke(&dir, &["createProduct", "V1"]).success();
    trace(&dir)
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("index consistent: 1 product(s)"));
}

#[test]
fn verify_detects_orphaned_index_entry() {
    let dir = initialized();
    supplier_invoke(&dir, &["createProduct", "V1"]).success();

    // Drop the record from the ledger document, keeping the index entry.
    let path = dir.path().join("trace-ledger.json");
    let mut doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    doc["entries"].as_object_mut().unwrap().remove("product_V1");
    fs::write(&path, doc.to_string()).unwrap();

    trace(&dir)
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("indexed without record: product_V1"));
}

#[test]
fn corrupt_ledger_file_exits_1() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("trace-ledger.json"), "not json").unwrap();
    trace(&dir).arg("verify").assert().failure();
}

// ──────────────────────────────────────────────
// 6. Serve flag validation
// ──────────────────────────────────────────────

#[test]
fn serve_requires_both_tls_flags() {
    let dir = TempDir::new().unwrap();
    trace(&dir)
        .args(["serve", "--tls-cert", "cert.pem"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tls-key"));
}
