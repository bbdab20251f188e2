use std::future::Future;

use super::{committed, err, seed, TestResult};
use crate::Ledger;

pub(super) async fn run_snapshot_tests<L, F, Fut>(factory: &F) -> Vec<TestResult>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        TestResult::from_result(
            "snapshot",
            "absent_key_reads_none",
            absent_key_reads_none(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "read_your_writes",
            read_your_writes(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "uncommitted_write_invisible_to_query",
            uncommitted_write_invisible_to_query(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "uncommitted_write_invisible_to_other_snapshot",
            uncommitted_write_invisible_to_other_snapshot(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "abort_discards_writes",
            abort_discards_writes(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "sequential_snapshots_see_prior_commits",
            sequential_snapshots_see_prior_commits(factory).await,
        ),
    ]
}

async fn absent_key_reads_none<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    let value = l.get_state(&mut snap, "missing").await.map_err(err("get"))?;
    if value.is_some() {
        return Err(format!("expected None, got {:?}", value));
    }
    l.abort_snapshot(snap).await.map_err(err("abort"))?;
    Ok(())
}

/// A key written in a snapshot is returned by a later read in the same snapshot.
async fn read_your_writes<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("k", "committed")]).await?;

    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    l.put_state(&mut snap, "k", b"buffered".to_vec())
        .await
        .map_err(err("put"))?;
    let value = l.get_state(&mut snap, "k").await.map_err(err("get"))?;
    if value.as_deref() != Some(b"buffered".as_slice()) {
        return Err(format!("expected buffered value, got {:?}", value));
    }
    l.abort_snapshot(snap).await.map_err(err("abort"))?;
    Ok(())
}

async fn uncommitted_write_invisible_to_query<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    l.put_state(&mut snap, "k", b"v".to_vec())
        .await
        .map_err(err("put"))?;

    if let Some(v) = committed(&l, "k").await? {
        return Err(format!("uncommitted write visible to query: {v}"));
    }
    l.commit_snapshot(snap).await.map_err(err("commit"))?;
    if committed(&l, "k").await?.as_deref() != Some("v") {
        return Err("committed write not visible to query".to_string());
    }
    Ok(())
}

async fn uncommitted_write_invisible_to_other_snapshot<L, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    let mut writer = l.begin_snapshot().await.map_err(err("begin writer"))?;
    let mut reader = l.begin_snapshot().await.map_err(err("begin reader"))?;

    l.put_state(&mut writer, "k", b"v".to_vec())
        .await
        .map_err(err("put"))?;
    let seen = l.get_state(&mut reader, "k").await.map_err(err("get"))?;
    if seen.is_some() {
        return Err(format!("other snapshot saw uncommitted write: {:?}", seen));
    }

    l.abort_snapshot(writer).await.map_err(err("abort writer"))?;
    l.abort_snapshot(reader).await.map_err(err("abort reader"))?;
    Ok(())
}

async fn abort_discards_writes<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("k", "original")]).await?;

    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    l.put_state(&mut snap, "k", b"changed".to_vec())
        .await
        .map_err(err("put k"))?;
    l.put_state(&mut snap, "other", b"new".to_vec())
        .await
        .map_err(err("put other"))?;
    l.abort_snapshot(snap).await.map_err(err("abort"))?;

    if committed(&l, "k").await?.as_deref() != Some("original") {
        return Err("aborted write replaced committed value".to_string());
    }
    if committed(&l, "other").await?.is_some() {
        return Err("aborted write created a key".to_string());
    }
    Ok(())
}

async fn sequential_snapshots_see_prior_commits<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("k", "first")]).await?;
    seed(&l, &[("k", "second")]).await?;

    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    let value = l.get_state(&mut snap, "k").await.map_err(err("get"))?;
    if value.as_deref() != Some(b"second".as_slice()) {
        return Err(format!("expected second commit, got {:?}", value));
    }
    l.abort_snapshot(snap).await.map_err(err("abort"))?;
    Ok(())
}
