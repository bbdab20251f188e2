use std::path::Path;
use std::process;

use trace_contract::Failure;

use super::{block_on, fail, open_engine};
use crate::OutputFormat;

/// Check the product index against the stored records; exits 1 on drift.
pub(crate) fn cmd_verify(ledger_path: &Path, output: OutputFormat, quiet: bool) {
    let engine = open_engine(ledger_path, output, quiet);
    let report = match block_on(engine.verify_index(), output, quiet) {
        Ok(report) => report,
        Err(e) => fail(&Failure::from(&e), output, quiet),
    };

    if !quiet {
        match output {
            OutputFormat::Text => {
                if report.is_consistent() {
                    println!("index consistent: {} product(s)", report.indexed);
                } else {
                    println!(
                        "index inconsistent: {} indexed, {} record(s)",
                        report.indexed, report.records
                    );
                    for key in &report.orphaned_keys {
                        println!("  indexed without record: {}", key);
                    }
                    for key in &report.unindexed_keys {
                        println!("  record missing from index: {}", key);
                    }
                }
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "consistent": report.is_consistent(),
                    "report": report,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
                );
            }
        }
    }

    if !report.is_consistent() {
        process::exit(1);
    }
}
