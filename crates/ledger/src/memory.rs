use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::LedgerError;
use crate::traits::Ledger;
use crate::world::{CommitReceipt, Snapshot, VersionedValue, WorldState};

/// Process-local ledger. Clones share the same world state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    world: Arc<Mutex<WorldState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current ledger height (number of non-empty commits).
    pub async fn height(&self) -> u64 {
        self.world.lock().await.height
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    type Snapshot = Snapshot;

    async fn begin_snapshot(&self) -> Result<Snapshot, LedgerError> {
        Ok(Snapshot::new())
    }

    async fn commit_snapshot(&self, snapshot: Snapshot) -> Result<CommitReceipt, LedgerError> {
        let mut world = self.world.lock().await;
        world.validate(&snapshot)?;
        let receipt = world.apply(&snapshot);
        tracing::debug!(
            tx_id = %receipt.tx_id,
            height = receipt.height,
            keys = receipt.written_keys.len(),
            "memory ledger commit"
        );
        Ok(receipt)
    }

    async fn abort_snapshot(&self, _snapshot: Snapshot) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn get_state(
        &self,
        snapshot: &mut Snapshot,
        key: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.world.lock().await.read_in(snapshot, key))
    }

    async fn put_state(
        &self,
        snapshot: &mut Snapshot,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), LedgerError> {
        snapshot.buffer_write(key, value);
        Ok(())
    }

    async fn read_committed(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError> {
        Ok(self.world.lock().await.read(key).cloned())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, LedgerError> {
        Ok(self.world.lock().await.keys_with_prefix(prefix))
    }
}
