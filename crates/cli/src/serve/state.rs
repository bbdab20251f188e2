//! Application state shared across request handlers.

use trace_contract::TransitionEngine;
use trace_ledger::FileLedger;

pub(crate) struct AppState {
    pub(crate) engine: TransitionEngine<FileLedger>,
    /// Optional API key for authentication. None = no auth required.
    pub(crate) api_key: Option<String>,
}
