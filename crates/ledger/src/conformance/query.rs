use std::future::Future;

use super::{committed, err, seed, TestResult};
use crate::Ledger;

pub(super) async fn run_query_tests<L, F, Fut>(factory: &F) -> Vec<TestResult>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        TestResult::from_result(
            "query",
            "read_committed_returns_exact_bytes",
            read_committed_returns_exact_bytes(factory).await,
        ),
        TestResult::from_result(
            "query",
            "read_committed_missing_is_none",
            read_committed_missing_is_none(factory).await,
        ),
        TestResult::from_result(
            "query",
            "list_keys_sorted_by_prefix",
            list_keys_sorted_by_prefix(factory).await,
        ),
        TestResult::from_result(
            "query",
            "empty_value_reads_as_absent",
            empty_value_reads_as_absent(factory).await,
        ),
    ]
}

async fn read_committed_returns_exact_bytes<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    let payload = r#"{"productId":"ABC123","state":"manufactured"}"#;
    seed(&l, &[("product_ABC123", payload)]).await?;

    match committed(&l, "product_ABC123").await? {
        Some(v) if v == payload => Ok(()),
        other => Err(format!("expected {payload}, got {:?}", other)),
    }
}

async fn read_committed_missing_is_none<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    match committed(&l, "nope").await? {
        None => Ok(()),
        Some(v) => Err(format!("expected None, got {v}")),
    }
}

async fn list_keys_sorted_by_prefix<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(
        &l,
        &[
            ("product_c", "{}"),
            ("product_a", "{}"),
            ("productIDs", "[]"),
            ("product_b", "{}"),
            ("shipment_a", "{}"),
        ],
    )
    .await?;

    let keys = l.list_keys("product_").await.map_err(err("list"))?;
    let expected = vec!["product_a", "product_b", "product_c"];
    if keys != expected {
        return Err(format!("expected {:?}, got {:?}", expected, keys));
    }
    Ok(())
}

async fn empty_value_reads_as_absent<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: Ledger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let l = factory().await;
    seed(&l, &[("blank", "")]).await?;

    if committed(&l, "blank").await?.is_some() {
        return Err("empty value visible to query".to_string());
    }
    let mut snap = l.begin_snapshot().await.map_err(err("begin"))?;
    if l.get_state(&mut snap, "blank")
        .await
        .map_err(err("get"))?
        .is_some()
    {
        return Err("empty value visible inside snapshot".to_string());
    }
    l.abort_snapshot(snap).await.map_err(err("abort"))?;

    if !l.list_keys("").await.map_err(err("list"))?.is_empty() {
        return Err("empty value listed".to_string());
    }
    Ok(())
}
