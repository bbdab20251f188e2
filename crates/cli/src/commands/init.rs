use std::path::Path;

use trace_contract::{dispatch, Response};

use super::{block_on, fail, open_engine};
use crate::OutputFormat;

pub(crate) fn cmd_init(ledger_path: &Path, output: OutputFormat, quiet: bool) {
    let engine = open_engine(ledger_path, output, quiet);
    match block_on(dispatch::init(&engine, &[]), output, quiet) {
        Response::Success(_) => {
            if quiet {
                return;
            }
            match output {
                OutputFormat::Text => println!("initialized {}", ledger_path.display()),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "initialized": true, "ledger": ledger_path.display().to_string() })
                ),
            }
        }
        Response::Failure(failure) => fail(&failure, output, quiet),
    }
}
