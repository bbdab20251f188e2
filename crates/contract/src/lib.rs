//! Product traceability contract.
//!
//! Tracks a product through a fixed supply-chain lifecycle
//! (manufactured, inspected, shipped, stocked, labeled, sold) on top of a
//! [`trace_ledger::Ledger`]. Each transition is gated by the caller's
//! affiliation and permission set, and every invocation runs in a single
//! ledger snapshot that commits all of its writes or none of them.
//!
//! ```ignore
//! use trace_contract::{dispatch, StaticIdentity, TransitionEngine};
//! use trace_ledger::MemoryLedger;
//!
//! let engine = TransitionEngine::new(MemoryLedger::new());
//! dispatch::init(&engine, &[]).await;
//! let supplier = StaticIdentity::new("Supplier").with_permissions("manufacture");
//! let response = dispatch::invoke(&engine, &supplier, "createProduct", &["ABC123".into()]).await;
//! ```

pub mod authorization;
pub mod clock;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod record;
pub mod store;

pub use authorization::{authorize, required_role, Denial, Role};
pub use clock::{Clock, SteppingClock, SystemClock};
pub use dispatch::{Failure, Operation, Response};
pub use engine::{IndexReport, TransitionEngine};
pub use error::ContractError;
pub use identity::{IdentityAssertion, IdentityOracle, StaticIdentity};
pub use lifecycle::{Edge, LifecycleState, Transition};
pub use record::{ProductIndex, ProductRecord, PRODUCT_INDEX_KEY};
pub use store::ProductStore;
