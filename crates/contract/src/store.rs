//! Product record store adapter.
//!
//! A [`ProductStore`] wraps one ledger snapshot and speaks in records and
//! indexes instead of keys and bytes. All reads go through the snapshot so
//! that the ledger sees them at commit time; all writes stay buffered until
//! [`ProductStore::finish`] commits.

use trace_ledger::{CommitReceipt, Ledger};

use crate::error::ContractError;
use crate::record::{record_key, ProductIndex, ProductRecord, PRODUCT_INDEX_KEY};

pub struct ProductStore<'a, L: Ledger> {
    ledger: &'a L,
    snapshot: L::Snapshot,
}

impl<'a, L: Ledger> ProductStore<'a, L> {
    pub async fn begin(ledger: &'a L) -> Result<Self, ContractError> {
        let snapshot = ledger.begin_snapshot().await?;
        Ok(Self { ledger, snapshot })
    }

    /// The record for `product_id`, if one exists.
    ///
    /// A stored record naming a different product fails with `CorruptRecord`.
    pub async fn load_record(
        &mut self,
        product_id: &str,
    ) -> Result<Option<ProductRecord>, ContractError> {
        let key = record_key(product_id)?;
        let Some(bytes) = self.ledger.get_state(&mut self.snapshot, &key).await? else {
            return Ok(None);
        };
        let record = ProductRecord::from_bytes(&key, &bytes)?;
        if record.product_id != product_id {
            return Err(ContractError::CorruptRecord {
                key,
                reason: format!("record names product {:?}", record.product_id),
            });
        }
        Ok(Some(record))
    }

    /// Write a record that must not exist yet.
    pub async fn insert_record(&mut self, record: &ProductRecord) -> Result<(), ContractError> {
        if self.load_record(&record.product_id).await?.is_some() {
            return Err(ContractError::DuplicateProduct {
                product_id: record.product_id.clone(),
            });
        }
        self.save_record(record).await
    }

    /// Write a record, replacing whatever is at its key.
    pub async fn save_record(&mut self, record: &ProductRecord) -> Result<(), ContractError> {
        let key = record_key(&record.product_id)?;
        let bytes = record.to_bytes()?;
        self.ledger.put_state(&mut self.snapshot, &key, bytes).await?;
        Ok(())
    }

    /// The product index. Fails with `IndexNotInitialized` if `init` never ran.
    pub async fn load_index(&mut self) -> Result<ProductIndex, ContractError> {
        match self
            .ledger
            .get_state(&mut self.snapshot, PRODUCT_INDEX_KEY)
            .await?
        {
            Some(bytes) => ProductIndex::from_bytes(&bytes),
            None => Err(ContractError::IndexNotInitialized),
        }
    }

    pub async fn save_index(&mut self, index: &ProductIndex) -> Result<(), ContractError> {
        let bytes = index.to_bytes()?;
        self.ledger
            .put_state(&mut self.snapshot, PRODUCT_INDEX_KEY, bytes)
            .await?;
        Ok(())
    }

    /// Create an empty index unless one is already present.
    ///
    /// Returns true if an index was written.
    pub async fn init_index(&mut self) -> Result<bool, ContractError> {
        match self.load_index().await {
            Ok(_) => Ok(false),
            Err(ContractError::IndexNotInitialized) => {
                self.save_index(&ProductIndex::new()).await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Commit the snapshot if `staged` succeeded, otherwise abort it and
    /// return the staging error.
    pub async fn finish<T>(
        self,
        staged: Result<T, ContractError>,
    ) -> Result<(T, CommitReceipt), ContractError> {
        match staged {
            Ok(value) => {
                let receipt = self.ledger.commit_snapshot(self.snapshot).await?;
                Ok((value, receipt))
            }
            Err(e) => {
                if let Err(abort_err) = self.ledger.abort_snapshot(self.snapshot).await {
                    tracing::warn!(error = %abort_err, "failed to abort snapshot");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_ledger::MemoryLedger;

    async fn initialized() -> MemoryLedger {
        let ledger = MemoryLedger::new();
        let mut store = ProductStore::begin(&ledger).await.unwrap();
        let staged = store.init_index().await;
        store.finish(staged).await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn missing_index_is_reported() {
        let ledger = MemoryLedger::new();
        let mut store = ProductStore::begin(&ledger).await.unwrap();
        assert!(matches!(
            store.load_index().await,
            Err(ContractError::IndexNotInitialized)
        ));
    }

    #[tokio::test]
    async fn init_index_is_idempotent() {
        let ledger = initialized().await;
        let mut store = ProductStore::begin(&ledger).await.unwrap();
        let staged = store.init_index().await;
        let (written, receipt) = store.finish(staged).await.unwrap();
        assert!(!written);
        assert!(receipt.written_keys.is_empty());
    }

    #[tokio::test]
    async fn insert_then_duplicate() {
        let ledger = initialized().await;
        let record = ProductRecord::manufactured("A1", "t0".into());

        let mut store = ProductStore::begin(&ledger).await.unwrap();
        let staged = store.insert_record(&record).await;
        store.finish(staged).await.unwrap();

        let mut store = ProductStore::begin(&ledger).await.unwrap();
        let staged = store.insert_record(&record).await;
        assert!(matches!(
            store.finish(staged).await,
            Err(ContractError::DuplicateProduct { product_id }) if product_id == "A1"
        ));
    }

    #[tokio::test]
    async fn failed_staging_writes_nothing() {
        let ledger = initialized().await;
        let mut store = ProductStore::begin(&ledger).await.unwrap();
        store
            .save_record(&ProductRecord::manufactured("A1", "t0".into()))
            .await
            .unwrap();
        let staged: Result<(), _> = Err(ContractError::IndexNotInitialized);
        assert!(store.finish(staged).await.is_err());
        assert!(ledger.read_committed("product_A1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_record_surfaces() {
        let ledger = initialized().await;
        let mut snapshot = ledger.begin_snapshot().await.unwrap();
        ledger
            .put_state(&mut snapshot, "product_bad", b"not json".to_vec())
            .await
            .unwrap();
        ledger.commit_snapshot(snapshot).await.unwrap();

        let mut store = ProductStore::begin(&ledger).await.unwrap();
        let err = store.load_record("bad").await.unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[tokio::test]
    async fn record_under_foreign_key_is_corrupt() {
        let ledger = initialized().await;
        let mut snapshot = ledger.begin_snapshot().await.unwrap();
        let body = ProductRecord::manufactured("B", "t0".into()).to_bytes().unwrap();
        ledger
            .put_state(&mut snapshot, "product_A", body)
            .await
            .unwrap();
        ledger.commit_snapshot(snapshot).await.unwrap();

        let mut store = ProductStore::begin(&ledger).await.unwrap();
        assert!(matches!(
            store.load_record("A").await,
            Err(ContractError::CorruptRecord { key, .. }) if key == "product_A"
        ));
    }
}
