use std::path::PathBuf;

/// All errors that can be returned by a [`Ledger`](crate::Ledger) implementation.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// MVCC conflict: a key read by the snapshot was committed by another
    /// transaction before this snapshot committed. Nothing was written.
    #[error("concurrent conflict on key {key}: read version is stale")]
    ConcurrentConflict { key: String },

    /// The ledger file could not be read or written.
    #[error("ledger file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger file exists but does not hold a valid world state document.
    #[error("ledger file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// A backend-specific error (encoding, unsupported value, etc.).
    #[error("ledger backend error: {0}")]
    Backend(String),
}
