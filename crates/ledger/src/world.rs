//! World state and snapshot bookkeeping shared by the ledger backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LedgerError;

/// A committed value together with the version it was committed at.
///
/// Versions start at 1 for a newly created key and increase by one on
/// every committed write of that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub version: u64,
    pub value: Vec<u8>,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// SHA-256 hex digest over the commit height and the write set.
    pub tx_id: String,
    /// Ledger height after this commit. Empty write sets do not advance it.
    pub height: u64,
    /// Keys written by this commit, sorted.
    pub written_keys: Vec<String>,
}

/// An in-progress transaction: the versions it read and the writes it buffered.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// key -> committed version observed on first read (None = absent).
    read_set: BTreeMap<String, Option<u64>>,
    write_set: BTreeMap<String, Vec<u8>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn buffer_write(&mut self, key: &str, value: Vec<u8>) {
        self.write_set.insert(key.to_string(), value);
    }
}

/// The committed key-value state of a ledger.
#[derive(Debug, Clone, Default)]
pub(crate) struct WorldState {
    pub(crate) entries: BTreeMap<String, VersionedValue>,
    pub(crate) height: u64,
}

impl WorldState {
    /// Committed value at `key`; empty values read as absent.
    pub(crate) fn read(&self, key: &str) -> Option<&VersionedValue> {
        self.entries.get(key).filter(|v| !v.value.is_empty())
    }

    /// Snapshot read: own writes first, otherwise the committed value with
    /// its version recorded in the read set.
    pub(crate) fn read_in(&self, snapshot: &mut Snapshot, key: &str) -> Option<Vec<u8>> {
        if let Some(buffered) = snapshot.write_set.get(key) {
            return (!buffered.is_empty()).then(|| buffered.clone());
        }
        let committed = self.entries.get(key);
        snapshot
            .read_set
            .entry(key.to_string())
            .or_insert_with(|| committed.map(|v| v.version));
        committed
            .filter(|v| !v.value.is_empty())
            .map(|v| v.value.clone())
    }

    pub(crate) fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(_, v)| !v.value.is_empty())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Check every read version against the current committed version.
    pub(crate) fn validate(&self, snapshot: &Snapshot) -> Result<(), LedgerError> {
        for (key, read_version) in &snapshot.read_set {
            let current = self.entries.get(key).map(|v| v.version);
            if current != *read_version {
                return Err(LedgerError::ConcurrentConflict { key: key.clone() });
            }
        }
        Ok(())
    }

    /// Apply a validated snapshot's write set. Callers must call
    /// [`WorldState::validate`] first.
    pub(crate) fn apply(&mut self, snapshot: &Snapshot) -> CommitReceipt {
        if snapshot.write_set.is_empty() {
            return CommitReceipt {
                tx_id: tx_digest(self.height, &snapshot.write_set),
                height: self.height,
                written_keys: Vec::new(),
            };
        }

        self.height += 1;
        for (key, value) in &snapshot.write_set {
            let version = self.entries.get(key).map(|v| v.version + 1).unwrap_or(1);
            self.entries.insert(
                key.clone(),
                VersionedValue {
                    version,
                    value: value.clone(),
                },
            );
        }

        CommitReceipt {
            tx_id: tx_digest(self.height, &snapshot.write_set),
            height: self.height,
            written_keys: snapshot.write_set.keys().cloned().collect(),
        }
    }
}

fn tx_digest(height: u64, writes: &BTreeMap<String, Vec<u8>>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(height.to_be_bytes());
    for (key, value) in writes {
        hasher.update((key.len() as u64).to_be_bytes());
        hasher.update(key.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
