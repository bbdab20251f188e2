//! Operation dispatcher.
//!
//! Routes a named invocation to the matching engine operation and turns
//! the outcome into a [`Response`]: the payload bytes on success, or a
//! structured [`Failure`] carrying the error kind.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use trace_ledger::Ledger;

use crate::clock::Clock;
use crate::engine::TransitionEngine;
use crate::error::ContractError;
use crate::identity::IdentityOracle;

/// Named operations callers may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateProduct,
    UpdateProductState,
    Query,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::CreateProduct,
        Operation::UpdateProductState,
        Operation::Query,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::CreateProduct => "createProduct",
            Operation::UpdateProductState => "updateProductState",
            Operation::Query => "query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ContractError::MissingOperation);
        }
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ContractError::UnrecognizedOperation {
                name: s.to_string(),
            })
    }
}

/// A failed invocation as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub kind: String,
    pub message: String,
    /// Set for data-corruption conditions rather than caller misuse.
    pub invariant_violation: bool,
}

impl From<&ContractError> for Failure {
    fn from(err: &ContractError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            invariant_violation: err.is_invariant_violation(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Success(Vec<u8>),
    Failure(Failure),
}

impl Response {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Response::Success(bytes) => Some(bytes),
            Response::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Response::Success(_) => None,
            Response::Failure(failure) => Some(failure),
        }
    }

    fn from_result(function: &str, result: Result<Vec<u8>, ContractError>) -> Self {
        match result {
            Ok(bytes) => Response::Success(bytes),
            Err(err) => {
                if err.is_invariant_violation() {
                    tracing::error!(function, kind = err.kind(), error = %err, "invariant violation");
                } else {
                    tracing::warn!(function, kind = err.kind(), error = %err, "invocation rejected");
                }
                Response::Failure(Failure::from(&err))
            }
        }
    }
}

/// Run the operation named `function` as `caller`.
pub async fn dispatch<L, C, O>(
    engine: &TransitionEngine<L, C>,
    caller: &O,
    function: &str,
    args: &[String],
) -> Result<Vec<u8>, ContractError>
where
    L: Ledger,
    C: Clock,
    O: IdentityOracle + Sync + ?Sized,
{
    match function.parse::<Operation>()? {
        Operation::CreateProduct => engine.create_product(caller, args).await?.to_bytes(),
        Operation::UpdateProductState => engine.update_product_state(caller, args).await?.to_bytes(),
        Operation::Query => engine.query(args).await,
    }
}

/// Dispatch and wrap the outcome in a [`Response`].
pub async fn invoke<L, C, O>(
    engine: &TransitionEngine<L, C>,
    caller: &O,
    function: &str,
    args: &[String],
) -> Response
where
    L: Ledger,
    C: Clock,
    O: IdentityOracle + Sync + ?Sized,
{
    tracing::debug!(function, args = args.len(), "invoke");
    Response::from_result(function, dispatch(engine, caller, function, args).await)
}

/// The init entry point. Succeeds with an empty payload.
pub async fn init<L, C>(engine: &TransitionEngine<L, C>, args: &[String]) -> Response
where
    L: Ledger,
    C: Clock,
{
    let result = engine.init(args).await.map(|_| Vec::new());
    Response::from_result("init", result)
}
