use async_trait::async_trait;

use crate::error::LedgerError;
use crate::world::{CommitReceipt, VersionedValue};

/// The ledger trait the traceability contract runs against.
///
/// A `Ledger` implementation provides a replicated (or, for local use,
/// process-owned) key-value world state with transactional snapshots.
///
/// ## Snapshot Semantics
///
/// Every contract invocation runs inside one `Snapshot`:
///
/// 1. `begin_snapshot()` -- start a transaction, returns a `Snapshot`
/// 2. `get_state` / `put_state` with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)` -- validate and apply all writes
///    OR `abort_snapshot(snapshot)` -- discard all writes
///
/// Writes are buffered and invisible to other readers until commit.
/// A key written earlier in the same snapshot is returned by `get_state`
/// (read-your-writes).
///
/// ## MVCC Conflict Detection
///
/// `get_state` records the committed version of every key it reads.
/// `commit_snapshot` re-checks each recorded version; if any key was
/// committed (created, updated) by another transaction in between, the
/// commit returns `Err(LedgerError::ConcurrentConflict { .. })` and applies
/// nothing. Keys written without being read (blind writes) never conflict:
/// the last committed writer wins.
///
/// ## Empty values
///
/// An empty byte value reads as absent, both inside a snapshot and through
/// `read_committed`.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    /// Begin a new snapshot.
    async fn begin_snapshot(&self) -> Result<Self::Snapshot, LedgerError>;

    /// Validate the snapshot's read set and apply its write set atomically.
    async fn commit_snapshot(&self, snapshot: Self::Snapshot)
        -> Result<CommitReceipt, LedgerError>;

    /// Discard a snapshot and all of its buffered writes.
    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), LedgerError>;

    // ── Key-value access (within snapshot) ───────────────────────────────────

    /// Read the value visible to `snapshot` at `key`.
    async fn get_state(
        &self,
        snapshot: &mut Self::Snapshot,
        key: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Buffer a write of `value` at `key`.
    async fn put_state(
        &self,
        snapshot: &mut Self::Snapshot,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), LedgerError>;

    // ── Query operations (outside snapshot) ──────────────────────────────────

    /// Read the last committed value at `key` together with its version.
    async fn read_committed(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError>;

    /// List committed, non-empty keys starting with `prefix`, sorted.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, LedgerError>;
}
