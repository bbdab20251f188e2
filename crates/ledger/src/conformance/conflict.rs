use std::future::Future;
use std::sync::Arc;

use tokio::sync::Barrier;

use super::{committed, err, seed, TestResult};
use crate::{Ledger, LedgerError};

/// Number of concurrent tasks in the racing test.
const N: usize = 8;

pub(super) async fn run_conflict_tests<L, F, Fut>(factory: &F) -> Vec<TestResult>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        TestResult::from_result(
            "conflict",
            "stale_read_rejected",
            stale_read_rejected(factory).await,
        ),
        TestResult::from_result(
            "conflict",
            "phantom_create_rejected",
            phantom_create_rejected(factory).await,
        ),
        TestResult::from_result(
            "conflict",
            "conflict_applies_nothing",
            conflict_applies_nothing(factory).await,
        ),
        TestResult::from_result(
            "conflict",
            "blind_writes_do_not_conflict",
            blind_writes_do_not_conflict(factory).await,
        ),
        TestResult::from_result(
            "conflict",
            "racing_read_modify_write_exactly_one_wins",
            racing_read_modify_write_exactly_one_wins(factory).await,
        ),
    ]
}

fn expect_conflict<T: std::fmt::Debug>(
    result: Result<T, LedgerError>,
    key: &str,
) -> Result<(), String> {
    match result {
        Err(LedgerError::ConcurrentConflict { key: k }) if k == key => Ok(()),
        other => Err(format!("expected ConcurrentConflict on {key}, got {:?}", other)),
    }
}

/// A snapshot that read a key later committed by someone else cannot commit.
async fn stale_read_rejected<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("k", "1")]).await?;

    let mut stale = l.begin_snapshot().await.map_err(err("begin"))?;
    l.get_state(&mut stale, "k").await.map_err(err("get"))?;
    seed(&l, &[("k", "2")]).await?;

    l.put_state(&mut stale, "k", b"3".to_vec())
        .await
        .map_err(err("put"))?;
    expect_conflict(l.commit_snapshot(stale).await, "k")
}

/// Reading an absent key and then having it created elsewhere is a conflict.
async fn phantom_create_rejected<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;

    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    if l.get_state(&mut snap, "product_X")
        .await
        .map_err(err("get"))?
        .is_some()
    {
        return Err("fresh ledger returned a value".to_string());
    }
    seed(&l, &[("product_X", "{}")]).await?;

    l.put_state(&mut snap, "product_X", b"{\"dup\":true}".to_vec())
        .await
        .map_err(err("put"))?;
    expect_conflict(l.commit_snapshot(snap).await, "product_X")
}

/// A rejected commit writes none of its keys, including keys it never read.
async fn conflict_applies_nothing<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("productIDs", "[]")]).await?;

    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    l.get_state(&mut snap, "productIDs")
        .await
        .map_err(err("get"))?;
    seed(&l, &[("productIDs", "[\"product_other\"]")]).await?;

    l.put_state(&mut snap, "product_mine", b"{}".to_vec())
        .await
        .map_err(err("put record"))?;
    l.put_state(&mut snap, "productIDs", b"[\"product_mine\"]".to_vec())
        .await
        .map_err(err("put index"))?;
    expect_conflict(l.commit_snapshot(snap).await, "productIDs")?;

    if committed(&l, "product_mine").await?.is_some() {
        return Err("record written by a conflicting commit".to_string());
    }
    if committed(&l, "productIDs").await?.as_deref() != Some("[\"product_other\"]") {
        return Err("index overwritten by a conflicting commit".to_string());
    }
    Ok(())
}

async fn blind_writes_do_not_conflict<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    let mut first = l.begin_snapshot().await.map_err(err("begin first"))?;
    let mut second = l.begin_snapshot().await.map_err(err("begin second"))?;

    l.put_state(&mut first, "k", b"first".to_vec())
        .await
        .map_err(err("put first"))?;
    l.put_state(&mut second, "k", b"second".to_vec())
        .await
        .map_err(err("put second"))?;
    l.commit_snapshot(first).await.map_err(err("commit first"))?;
    l.commit_snapshot(second)
        .await
        .map_err(err("commit second"))?;

    if committed(&l, "k").await?.as_deref() != Some("second") {
        return Err("last blind writer did not win".to_string());
    }
    Ok(())
}

/// N tasks read the same key, wait until all have read, then write and
/// commit. Exactly one commit succeeds; the rest get ConcurrentConflict.
async fn racing_read_modify_write_exactly_one_wins<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = Arc::new(factory().await);
    seed(ledger.as_ref(), &[("counter", "0")]).await?;
    let barrier = Arc::new(Barrier::new(N));

    let mut handles = Vec::new();
    for i in 0..N {
        let l = ledger.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            let mut snap = l.begin_snapshot().await?;
            l.get_state(&mut snap, "counter").await?;
            barrier.wait().await;
            l.put_state(&mut snap, "counter", i.to_string().into_bytes())
                .await?;
            match l.commit_snapshot(snap).await {
                Ok(_) => Ok(true),
                Err(LedgerError::ConcurrentConflict { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: LedgerError| format!("ledger error: {e}"))?;
        if won {
            winners += 1;
        }
    }

    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }
    Ok(())
}
