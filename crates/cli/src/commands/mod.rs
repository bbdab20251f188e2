//! One-shot subcommands run against a file-backed ledger.

pub(crate) mod init;
pub(crate) mod invoke;
pub(crate) mod lifecycle;
pub(crate) mod query;
pub(crate) mod verify;

use std::future::Future;
use std::path::Path;
use std::process;

use trace_contract::{Failure, TransitionEngine};
use trace_ledger::FileLedger;

use crate::{report_error, OutputFormat};

/// Run `future` to completion on a fresh tokio runtime.
pub(crate) fn block_on<F: Future>(future: F, output: OutputFormat, quiet: bool) -> F::Output {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {}", e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };
    rt.block_on(future)
}

/// Open the ledger at `path` and wrap it in an engine, exiting on failure.
pub(crate) fn open_engine(
    path: &Path,
    output: OutputFormat,
    quiet: bool,
) -> TransitionEngine<FileLedger> {
    match FileLedger::open(path) {
        Ok(ledger) => TransitionEngine::new(ledger),
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// Print a contract failure to stderr and exit 1.
pub(crate) fn fail(failure: &Failure, output: OutputFormat, quiet: bool) -> ! {
    if !quiet {
        match output {
            OutputFormat::Text => {
                eprintln!("error: {}", failure);
                if failure.invariant_violation {
                    eprintln!("  (stored data violates a contract invariant)");
                }
            }
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({ "error": failure }));
            }
        }
    }
    process::exit(1);
}
