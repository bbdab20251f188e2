use trace_ledger::LedgerError;

use crate::authorization::Denial;
use crate::lifecycle::LifecycleState;

/// Every way a contract invocation can fail.
///
/// Failures are local to one invocation: validation failures are raised
/// before anything is written, and a failing invocation's snapshot is
/// aborted.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// Wrong number of arguments for an operation.
    #[error("{operation} expects {expected} argument(s), got {actual}")]
    Arity {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An argument is present but unusable (e.g. an empty product id).
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The caller's affiliation or permission does not allow the transition.
    #[error("unauthorized access: {0}")]
    Unauthorized(Denial),

    #[error("product {product_id} already exists")]
    DuplicateProduct { product_id: String },

    #[error("product {product_id} not found")]
    ProductNotFound { product_id: String },

    /// The transition does not leave the record's current state.
    #[error(
        "illegal transition {transition} for product {product_id} in state {current}{}",
        requirement(.expected_from)
    )]
    IllegalTransition {
        product_id: String,
        transition: String,
        current: LifecycleState,
        /// Source state of the edge; `None` when the transition has no edge.
        expected_from: Option<LifecycleState>,
    },

    /// A record's history already holds the state being entered.
    #[error("history of product {product_id} already records state {state}")]
    DuplicateHistoryEntry {
        product_id: String,
        state: LifecycleState,
    },

    /// `query` found nothing at the key.
    #[error("no value for key {key}")]
    NotFound { key: String },

    #[error("unknown transition '{name}'")]
    UnknownTransition { name: String },

    /// The product index key is absent; `init` has not run on this ledger.
    #[error("product index not initialized; run init first")]
    IndexNotInitialized,

    /// Stored bytes at a contract key do not decode.
    #[error("corrupt value at key {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("missing operation name in invocation")]
    MissingOperation,

    #[error("unrecognized operation '{name}'")]
    UnrecognizedOperation { name: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

fn requirement(expected_from: &Option<LifecycleState>) -> String {
    match expected_from {
        Some(state) => format!(" (requires {})", state),
        None => " (not a lifecycle edge)".to_string(),
    }
}

impl ContractError {
    /// Stable failure kind reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            ContractError::Arity { .. } => "ArityError",
            ContractError::InvalidArgument { .. } => "InvalidArgument",
            ContractError::Unauthorized(_) => "Unauthorized",
            ContractError::DuplicateProduct { .. } => "DuplicateProduct",
            ContractError::ProductNotFound { .. } => "ProductNotFound",
            ContractError::IllegalTransition { .. } => "IllegalTransition",
            ContractError::DuplicateHistoryEntry { .. } => "DuplicateHistoryEntry",
            ContractError::NotFound { .. } => "NotFound",
            ContractError::UnknownTransition { .. } => "UnknownTransition",
            ContractError::IndexNotInitialized => "IndexNotInitialized",
            ContractError::CorruptRecord { .. } => "CorruptRecord",
            ContractError::MissingOperation => "MissingOperation",
            ContractError::UnrecognizedOperation { .. } => "UnrecognizedOperation",
            ContractError::Ledger(LedgerError::ConcurrentConflict { .. }) => "ConcurrentConflict",
            ContractError::Ledger(_) => "LedgerError",
        }
    }

    /// True for data-corruption conditions, as opposed to caller misuse.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            ContractError::DuplicateHistoryEntry { .. } | ContractError::CorruptRecord { .. }
        )
    }

    /// True when the failure was caused by the caller's input or identity.
    pub fn is_caller_error(&self) -> bool {
        !self.is_invariant_violation() && !matches!(self, ContractError::Ledger(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_message_names_required_state() {
        let err = ContractError::IllegalTransition {
            product_id: "ABC123".into(),
            transition: "receive".into(),
            current: LifecycleState::Inspected,
            expected_from: Some(LifecycleState::Shipped),
        };
        assert_eq!(
            err.to_string(),
            "illegal transition receive for product ABC123 in state inspected (requires shipped)"
        );
    }

    #[test]
    fn illegal_manufacture_message() {
        let err = ContractError::IllegalTransition {
            product_id: "ABC123".into(),
            transition: "manufacture".into(),
            current: LifecycleState::Manufactured,
            expected_from: None,
        };
        assert!(err.to_string().ends_with("(not a lifecycle edge)"));
    }

    #[test]
    fn invariant_violations_are_not_caller_errors() {
        let dup = ContractError::DuplicateHistoryEntry {
            product_id: "p".into(),
            state: LifecycleState::Sold,
        };
        assert!(dup.is_invariant_violation());
        assert!(!dup.is_caller_error());

        let arity = ContractError::Arity {
            operation: "query",
            expected: 1,
            actual: 0,
        };
        assert!(!arity.is_invariant_violation());
        assert!(arity.is_caller_error());
        assert_eq!(arity.kind(), "ArityError");
    }

    #[test]
    fn ledger_conflict_kind() {
        let err = ContractError::from(LedgerError::ConcurrentConflict {
            key: "productIDs".into(),
        });
        assert_eq!(err.kind(), "ConcurrentConflict");
        assert!(!err.is_caller_error());
    }
}
