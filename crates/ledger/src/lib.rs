//! Ledger collaborator for the product traceability contract.
//!
//! A [`Ledger`] is a key-value world state with per-invocation snapshots:
//! reads are tracked in a read set, writes are buffered in a write set, and
//! a commit either applies every buffered write or none of them. Commits are
//! validated MVCC-style, so a snapshot that read a key another transaction
//! has since committed fails with [`LedgerError::ConcurrentConflict`].

pub mod conformance;
mod error;
mod file;
mod memory;
mod traits;
mod world;

pub use error::LedgerError;
pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use traits::Ledger;
pub use world::{CommitReceipt, Snapshot, VersionedValue};
