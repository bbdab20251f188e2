use std::path::Path;

use trace_contract::{dispatch, Response, StaticIdentity};

use super::{block_on, fail, open_engine};
use crate::OutputFormat;

/// Print the committed bytes at `key` unchanged.
pub(crate) fn cmd_query(ledger_path: &Path, key: &str, output: OutputFormat, quiet: bool) {
    let engine = open_engine(ledger_path, output, quiet);
    let args = [key.to_string()];
    let response = block_on(
        dispatch::invoke(&engine, &StaticIdentity::anonymous(), "query", &args),
        output,
        quiet,
    );
    match response {
        Response::Success(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
        Response::Failure(failure) => fail(&failure, output, quiet),
    }
}
