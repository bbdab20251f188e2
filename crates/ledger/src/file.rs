//! File-backed ledger.
//!
//! The world state lives in memory and is mirrored to a JSON document on
//! every commit that writes at least one key. The document is replaced
//! atomically (temp file in the same directory, then rename), so a crash
//! mid-commit leaves the previous state intact.
//!
//! One process owns a ledger file at a time; the file is read once at
//! [`FileLedger::open`].

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::LedgerError;
use crate::traits::Ledger;
use crate::world::{CommitReceipt, Snapshot, VersionedValue, WorldState};

/// On-disk world state document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    height: u64,
    entries: BTreeMap<String, DocumentEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentEntry {
    version: u64,
    value: String,
}

impl LedgerDocument {
    fn from_world(world: &WorldState) -> Result<Self, LedgerError> {
        let mut entries = BTreeMap::new();
        for (key, v) in &world.entries {
            let value = String::from_utf8(v.value.clone()).map_err(|_| {
                LedgerError::Backend(format!("value at key {} is not valid UTF-8", key))
            })?;
            entries.insert(
                key.clone(),
                DocumentEntry {
                    version: v.version,
                    value,
                },
            );
        }
        Ok(Self {
            height: world.height,
            entries,
        })
    }

    fn into_world(self) -> WorldState {
        WorldState {
            entries: self
                .entries
                .into_iter()
                .map(|(key, e)| {
                    (
                        key,
                        VersionedValue {
                            version: e.version,
                            value: e.value.into_bytes(),
                        },
                    )
                })
                .collect(),
            height: self.height,
        }
    }
}

/// Ledger persisted to a single JSON file.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    world: Mutex<WorldState>,
}

impl FileLedger {
    /// Open the ledger at `path`. A missing file is an empty ledger; the file
    /// is created by the first commit.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let world = match std::fs::read_to_string(&path) {
            Ok(text) => {
                let doc: LedgerDocument =
                    serde_json::from_str(&text).map_err(|e| LedgerError::Corrupt {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                doc.into_world()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => WorldState::default(),
            Err(source) => return Err(LedgerError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), height = world.height, "opened file ledger");
        Ok(Self {
            path,
            world: Mutex::new(world),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `world` to disk on the blocking pool.
    async fn persist(&self, world: &WorldState) -> Result<(), LedgerError> {
        let doc = LedgerDocument::from_world(world)?;
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| LedgerError::Backend(format!("failed to encode ledger: {}", e)))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| LedgerError::Backend(format!("ledger write task failed: {}", e)))?
    }
}

/// Replace the file at `path` with `bytes` via a synced temp file and rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_err = |source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[async_trait]
impl Ledger for FileLedger {
    type Snapshot = Snapshot;

    async fn begin_snapshot(&self) -> Result<Snapshot, LedgerError> {
        Ok(Snapshot::new())
    }

    async fn commit_snapshot(&self, snapshot: Snapshot) -> Result<CommitReceipt, LedgerError> {
        let mut world = self.world.lock().await;
        world.validate(&snapshot)?;

        let mut next = world.clone();
        let receipt = next.apply(&snapshot);
        if !receipt.written_keys.is_empty() {
            self.persist(&next).await?;
            *world = next;
            tracing::debug!(
                path = %self.path.display(),
                tx_id = %receipt.tx_id,
                height = receipt.height,
                "file ledger commit"
            );
        }
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
        if std::str::from_utf8(&value).is_err() {
            return Err(LedgerError::Backend(format!(
                "file ledger stores UTF-8 values only (key {})",
                key
            )));
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::open(dir.path().join("ledger.json")).unwrap();
        assert!(ledger.read_committed("anything").await.unwrap().is_none());
        assert!(!ledger.path().exists());
    }

    #[tokio::test]
    async fn commit_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        {
            let ledger = FileLedger::open(&path).unwrap();
            let mut snap = ledger.begin_snapshot().await.unwrap();
            ledger
                .put_state(&mut snap, "productIDs", b"[]".to_vec())
                .await
                .unwrap();
            ledger.commit_snapshot(snap).await.unwrap();
        }

        let reopened = FileLedger::open(&path).unwrap();
        let value = reopened.read_committed("productIDs").await.unwrap().unwrap();
        assert_eq!(value.value, b"[]".to_vec());
        assert_eq!(value.version, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("ledger.json");
        let ledger = FileLedger::open(&path).unwrap();

        let mut snap = ledger.begin_snapshot().await.unwrap();
        ledger.put_state(&mut snap, "k", b"1".to_vec()).await.unwrap();
        let result = ledger.commit_snapshot(snap).await;
        assert!(matches!(result, Err(LedgerError::Io { .. })));
        assert!(ledger.read_committed("k").await.unwrap().is_none());

        std::fs::create_dir(dir.path().join("missing")).unwrap();
        let mut snap = ledger.begin_snapshot().await.unwrap();
        ledger.put_state(&mut snap, "k", b"2".to_vec()).await.unwrap();
        let receipt = ledger.commit_snapshot(snap).await.unwrap();
        assert_eq!(receipt.height, 1);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileLedger::open(&path),
            Err(LedgerError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn non_utf8_value_rejected_at_put() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::open(dir.path().join("ledger.json")).unwrap();
        let mut snap = ledger.begin_snapshot().await.unwrap();
        let result = ledger.put_state(&mut snap, "k", vec![0xff, 0xfe]).await;
        assert!(matches!(result, Err(LedgerError::Backend(_))));
    }

    #[tokio::test]
    async fn conflicting_commit_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let ledger = FileLedger::open(&path).unwrap();

        let mut seed = ledger.begin_snapshot().await.unwrap();
        ledger.put_state(&mut seed, "k", b"1".to_vec()).await.unwrap();
        ledger.commit_snapshot(seed).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let mut stale = ledger.begin_snapshot().await.unwrap();
        ledger.get_state(&mut stale, "k").await.unwrap();

        let mut winner = ledger.begin_snapshot().await.unwrap();
        ledger.put_state(&mut winner, "k", b"2".to_vec()).await.unwrap();
        ledger.commit_snapshot(winner).await.unwrap();
        let after_winner = std::fs::read_to_string(&path).unwrap();
        assert_ne!(before, after_winner);

        ledger.put_state(&mut stale, "k", b"3".to_vec()).await.unwrap();
        let result = ledger.commit_snapshot(stale).await;
        assert!(matches!(result, Err(LedgerError::ConcurrentConflict { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_winner);
    }
}
