use std::future::Future;

use super::{committed, err, seed, TestResult};
use crate::Ledger;

pub(super) async fn run_commit_tests<L, F, Fut>(factory: &F) -> Vec<TestResult>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        TestResult::from_result(
            "commit",
            "multi_key_commit_applies_all",
            multi_key_commit_applies_all(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "receipt_lists_written_keys",
            receipt_lists_written_keys(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "receipt_height_advances",
            receipt_height_advances(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "read_only_commit_succeeds",
            read_only_commit_succeeds(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "version_increments_per_commit",
            version_increments_per_commit(factory).await,
        ),
    ]
}

/// A record and an index written in one snapshot become visible together.
async fn multi_key_commit_applies_all<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("product_A", "{}"), ("productIDs", "[\"product_A\"]")]).await?;

    if committed(&l, "product_A").await?.is_none() {
        return Err("record key missing after commit".to_string());
    }
    if committed(&l, "productIDs").await?.as_deref() != Some("[\"product_A\"]") {
        return Err("index key missing after commit".to_string());
    }
    Ok(())
}

async fn receipt_lists_written_keys<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    l.put_state(&mut snap, "b", b"2".to_vec())
        .await
        .map_err(err("put b"))?;
    l.put_state(&mut snap, "a", b"1".to_vec())
        .await
        .map_err(err("put a"))?;
    let receipt = l.commit_snapshot(snap).await.map_err(err("commit"))?;

    if receipt.written_keys != vec!["a".to_string(), "b".to_string()] {
        return Err(format!(
            "expected sorted written keys [a, b], got {:?}",
            receipt.written_keys
        ));
    }
    if receipt.tx_id.is_empty() {
        return Err("receipt has empty tx_id".to_string());
    }
    Ok(())
}

async fn receipt_height_advances<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    let mut heights = Vec::new();
    for value in ["1", "2", "3"] {
        let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
        l.put_state(&mut snap, "k", value.as_bytes().to_vec())
            .await
            .map_err(err("put"))?;
        heights.push(l.commit_snapshot(snap).await.map_err(err("commit"))?.height);
    }
    if heights != vec![1, 2, 3] {
        return Err(format!("expected heights [1, 2, 3], got {:?}", heights));
    }
    Ok(())
}

/// A snapshot that only reads commits without writing or advancing height.
async fn read_only_commit_succeeds<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("k", "v")]).await?;

    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    l.get_state(&mut snap, "k").await.map_err(err("get"))?;
    let receipt = l.commit_snapshot(snap).await.map_err(err("commit"))?;
    if !receipt.written_keys.is_empty() || receipt.height != 1 {
        return Err(format!("read-only commit changed the ledger: {:?}", receipt));
    }
    Ok(())
}

async fn version_increments_per_commit<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("k", "1")]).await?;
    seed(&l, &[("k", "2")]).await?;

    let value = l
        .read_committed("k")
        .await
        .map_err(err("read"))?
        .ok_or("key missing")?;
    if value.version != 2 {
        return Err(format!("expected version 2, got {}", value.version));
    }
    Ok(())
}
