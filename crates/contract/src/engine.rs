//! The transition engine.
//!
//! Every mutating operation follows the same shape: check arguments and
//! caller authority, open one ledger snapshot, stage reads and writes
//! through a [`ProductStore`], then commit on success or abort on failure.
//! Nothing is written to the snapshot until every validation has passed,
//! so a rejected invocation leaves the ledger exactly as it found it.

use serde::Serialize;
use trace_ledger::{CommitReceipt, Ledger};

use crate::authorization::authorize_transition;
use crate::clock::{Clock, SystemClock};
use crate::error::ContractError;
use crate::identity::{IdentityAssertion, IdentityOracle};
use crate::lifecycle::{self, Transition};
use crate::record::{record_key, ProductIndex, ProductRecord, PRODUCT_INDEX_KEY, PRODUCT_KEY_PREFIX};
use crate::store::ProductStore;

/// Result of [`TransitionEngine::verify_index`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub indexed: usize,
    pub records: usize,
    /// Index entries with no record behind them.
    pub orphaned_keys: Vec<String>,
    /// Records the index does not list.
    pub unindexed_keys: Vec<String>,
}

impl IndexReport {
    pub fn is_consistent(&self) -> bool {
        self.orphaned_keys.is_empty() && self.unindexed_keys.is_empty()
    }
}

pub struct TransitionEngine<L: Ledger, C: Clock = SystemClock> {
    ledger: L,
    clock: C,
}

impl<L: Ledger> TransitionEngine<L> {
    pub fn new(ledger: L) -> Self {
        Self::with_clock(ledger, SystemClock)
    }
}

impl<L: Ledger, C: Clock> TransitionEngine<L, C> {
    pub fn with_clock(ledger: L, clock: C) -> Self {
        Self { ledger, clock }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// One-time setup: create the empty product index.
    ///
    /// Takes no arguments. On a ledger that already has an index this
    /// succeeds without writing.
    pub async fn init(&self, args: &[String]) -> Result<Option<CommitReceipt>, ContractError> {
        expect_arity("init", args, 0)?;

        let mut store = ProductStore::begin(&self.ledger).await?;
        let staged = store.init_index().await;
        let (written, receipt) = store.finish(staged).await?;
        if written {
            tracing::info!(tx_id = %receipt.tx_id, height = receipt.height, "product index initialized");
            Ok(Some(receipt))
        } else {
            tracing::debug!("product index already initialized");
            Ok(None)
        }
    }

    /// `createProduct(productId)`: record a newly manufactured product.
    ///
    /// The record and the updated index are committed together.
    pub async fn create_product<O>(
        &self,
        caller: &O,
        args: &[String],
    ) -> Result<ProductRecord, ContractError>
    where
        O: IdentityOracle + Sync + ?Sized,
    {
        expect_arity("createProduct", args, 1)?;
        let identity = IdentityAssertion::resolve(caller);
        authorize_transition(&identity, Transition::Manufacture)?;
        let product_id = args[0].as_str();
        let key = record_key(product_id)?;

        let mut store = ProductStore::begin(&self.ledger).await?;
        let staged = self.stage_create(&mut store, product_id, key).await;
        let (record, receipt) = store.finish(staged).await?;

        tracing::info!(
            product_id,
            affiliation = %identity.affiliation,
            tx_id = %receipt.tx_id,
            height = receipt.height,
            "product created"
        );
        Ok(record)
    }

    async fn stage_create(
        &self,
        store: &mut ProductStore<'_, L>,
        product_id: &str,
        key: String,
    ) -> Result<ProductRecord, ContractError> {
        let record = ProductRecord::manufactured(product_id, self.clock.now());
        store.insert_record(&record).await?;
        let mut index = store.load_index().await?;
        index.insert(key);
        store.save_index(&index).await?;
        Ok(record)
    }

    /// `updateProductState(productId, transitionName)`: move a product one
    /// step along its lifecycle.
    pub async fn update_product_state<O>(
        &self,
        caller: &O,
        args: &[String],
    ) -> Result<ProductRecord, ContractError>
    where
        O: IdentityOracle + Sync + ?Sized,
    {
        expect_arity("updateProductState", args, 2)?;
        let product_id = args[0].as_str();
        let transition: Transition = args[1].parse()?;
        record_key(product_id)?;
        let identity = IdentityAssertion::resolve(caller);
        authorize_transition(&identity, transition)?;

        let mut store = ProductStore::begin(&self.ledger).await?;
        let staged = self.stage_update(&mut store, product_id, transition).await;
        let (record, receipt) = store.finish(staged).await?;

        tracing::info!(
            product_id,
            %transition,
            state = %record.state,
            tx_id = %receipt.tx_id,
            height = receipt.height,
            "product state updated"
        );
        Ok(record)
    }

    async fn stage_update(
        &self,
        store: &mut ProductStore<'_, L>,
        product_id: &str,
        transition: Transition,
    ) -> Result<ProductRecord, ContractError> {
        let mut record =
            store
                .load_record(product_id)
                .await?
                .ok_or_else(|| ContractError::ProductNotFound {
                    product_id: product_id.to_string(),
                })?;

        let illegal = |expected_from| ContractError::IllegalTransition {
            product_id: product_id.to_string(),
            transition: transition.to_string(),
            current: record.state,
            expected_from,
        };
        let edge = match lifecycle::edge(transition) {
            Some(edge) if edge.from == record.state => edge,
            Some(edge) => return Err(illegal(Some(edge.from))),
            None => return Err(illegal(None)),
        };

        record.advance(edge.to, self.clock.now())?;
        store.save_record(&record).await?;
        Ok(record)
    }

    /// `query(key)`: the exact committed bytes at `key`.
    ///
    /// Reads are public: traceability data is auditable by anyone who can
    /// reach the ledger, so no caller identity is consulted.
    pub async fn query(&self, args: &[String]) -> Result<Vec<u8>, ContractError> {
        expect_arity("query", args, 1)?;
        let key = args[0].as_str();
        let value = self
            .ledger
            .read_committed(key)
            .await?
            .ok_or_else(|| ContractError::NotFound {
                key: key.to_string(),
            })?;
        tracing::debug!(key, version = value.version, "query");
        Ok(value.value)
    }

    /// The committed product record for `product_id`.
    pub async fn product(&self, product_id: &str) -> Result<ProductRecord, ContractError> {
        let key = record_key(product_id)?;
        let Some(v) = self.ledger.read_committed(&key).await? else {
            return Err(ContractError::ProductNotFound {
                product_id: product_id.to_string(),
            });
        };
        let record = ProductRecord::from_bytes(&key, &v.value)?;
        if record.product_id != product_id {
            return Err(ContractError::CorruptRecord {
                key,
                reason: format!("record names product {:?}", record.product_id),
            });
        }
        Ok(record)
    }

    /// The committed product index.
    pub async fn product_index(&self) -> Result<ProductIndex, ContractError> {
        match self.ledger.read_committed(PRODUCT_INDEX_KEY).await? {
            Some(v) => ProductIndex::from_bytes(&v.value),
            None => Err(ContractError::IndexNotInitialized),
        }
    }

    /// Compare the committed index against the committed record keys.
    pub async fn verify_index(&self) -> Result<IndexReport, ContractError> {
        let index = self.product_index().await?;
        let records = self.ledger.list_keys(PRODUCT_KEY_PREFIX).await?;

        let orphaned_keys = index
            .keys()
            .iter()
            .filter(|k| records.binary_search(*k).is_err())
            .cloned()
            .collect();
        let unindexed_keys = records
            .iter()
            .filter(|k| !index.contains(k))
            .cloned()
            .collect();

        Ok(IndexReport {
            indexed: index.len(),
            records: records.len(),
            orphaned_keys,
            unindexed_keys,
        })
    }
}

fn expect_arity(operation: &'static str, args: &[String], expected: usize) -> Result<(), ContractError> {
    if args.len() != expected {
        return Err(ContractError::Arity {
            operation,
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}
