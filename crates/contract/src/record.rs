//! Persisted product records and the product index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::lifecycle::{self, LifecycleState};

/// Namespace prefix for product record keys.
pub const PRODUCT_KEY_PREFIX: &str = "product_";

/// Ledger key of the sorted product index.
pub const PRODUCT_INDEX_KEY: &str = "productIDs";

/// Ledger key for a product id. The fixed prefix keeps record keys apart
/// from each other and from [`PRODUCT_INDEX_KEY`].
pub fn record_key(product_id: &str) -> Result<String, ContractError> {
    if product_id.is_empty() {
        return Err(ContractError::InvalidArgument {
            reason: "product id must not be empty".to_string(),
        });
    }
    Ok(format!("{}{}", PRODUCT_KEY_PREFIX, product_id))
}

/// The product's traceability record as stored on the ledger.
///
/// `history` maps each visited state to the RFC 3339 time it was entered.
/// Because states only move forward, ordering the map by lifecycle order
/// is the same as ordering it by visitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_id: String,
    pub state: LifecycleState,
    pub history: BTreeMap<LifecycleState, String>,
}

impl ProductRecord {
    /// A freshly manufactured product.
    pub fn manufactured(product_id: &str, at: String) -> Self {
        let state = lifecycle::initial_state();
        Self {
            product_id: product_id.to_string(),
            state,
            history: BTreeMap::from([(state, at)]),
        }
    }

    /// Move to `to`, recording when. Each state may be recorded once.
    pub fn advance(&mut self, to: LifecycleState, at: String) -> Result<(), ContractError> {
        if self.history.contains_key(&to) {
            return Err(ContractError::DuplicateHistoryEntry {
                product_id: self.product_id.clone(),
                state: to,
            });
        }
        self.history.insert(to, at);
        self.state = to;
        Ok(())
    }

    pub fn entered_at(&self, state: LifecycleState) -> Option<&str> {
        self.history.get(&state).map(|s| s.as_str())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(|e| ContractError::CorruptRecord {
            key: PRODUCT_KEY_PREFIX.to_string() + &self.product_id,
            reason: e.to_string(),
        })
    }

    pub fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self, ContractError> {
        serde_json::from_slice(bytes).map_err(|e| ContractError::CorruptRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Sorted, duplicate-free list of every product record key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductIndex(Vec<String>);

impl ProductIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key`, keeping the index sorted. Returns false if it was present.
    pub fn insert(&mut self, key: String) -> bool {
        match self.0.binary_search(&key) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, key);
                true
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.binary_search_by(|k| k.as_str().cmp(key)).is_ok()
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(|e| ContractError::CorruptRecord {
            key: PRODUCT_INDEX_KEY.to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode a stored index, restoring sort order and dropping duplicates.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContractError> {
        let mut keys: Vec<String> =
            serde_json::from_slice(bytes).map_err(|e| ContractError::CorruptRecord {
                key: PRODUCT_INDEX_KEY.to_string(),
                reason: e.to_string(),
            })?;
        keys.sort();
        keys.dedup();
        Ok(Self(keys))
    }
}
