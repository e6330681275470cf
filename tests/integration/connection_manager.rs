//! Connection manager behavior against the in-memory connector

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use salesboard::db::{ConnectionManager, PoolStatus, RetryPolicy, SqlParam};
use salesboard::error::DbError;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

use crate::common::{MockConnector, rows, text};

fn policy(max_retries: u32, delay_ms: u64) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(delay_ms))
}

fn manager(connector: &MockConnector, policy: RetryPolicy) -> Arc<ConnectionManager<MockConnector>> {
    Arc::new(ConnectionManager::new(connector.clone(), policy))
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_two_failures() {
    let connector = MockConnector::new().failing(2);
    let db = manager(&connector, policy(5, 10));

    let start = Instant::now();
    let pool = db.get_connection().await.expect("third attempt succeeds");

    assert_eq!(connector.calls(), 3);
    assert_eq!(pool.id, 3);
    assert_eq!(start.elapsed(), Duration::from_millis(20));
    assert_eq!(db.status(), PoolStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_delay_only_between_attempts() {
    let connector = MockConnector::new();
    let db = manager(&connector, policy(5, 3000));

    let start = Instant::now();
    db.get_connection().await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_resets_and_next_call_starts_fresh() {
    let connector = MockConnector::new().always_failing();
    let db = manager(&connector, policy(3, 10));

    let err = db.get_connection().await.unwrap_err();
    assert_eq!(connector.calls(), 3);
    match &err {
        DbError::RetriesExhausted { attempts, last } => {
            assert_eq!(*attempts, 3);
            assert_eq!(last.to_string(), "Connection failed: attempt 3 refused");
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
    assert!(err.is_connection_error());
    assert_eq!(db.status(), PoolStatus::Empty);

    connector.heal();
    let start = Instant::now();
    let pool = db.get_connection().await.expect("fresh sequence succeeds");
    assert_eq!(connector.calls(), 4);
    assert_eq!(pool.id, 4);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_failed_sequence_is_not_cached() {
    let connector = MockConnector::new().always_failing();
    let db = manager(&connector, policy(2, 5));

    assert_err!(db.get_connection().await);
    assert_err!(db.get_connection().await);
    // each call got its own full retry budget
    assert_eq!(connector.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_one_initialization() {
    let connector = MockConnector::new().with_open_delay(Duration::from_millis(50));
    let db = manager(&connector, policy(5, 10));

    let pools = join_all((0..10).map(|_| db.get_connection())).await;

    assert_eq!(connector.calls(), 1);
    assert_eq!(pools.len(), 10);
    for pool in pools {
        assert_eq!(pool.expect("all callers succeed").id, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_one_failure() {
    let connector = MockConnector::new()
        .always_failing()
        .with_open_delay(Duration::from_millis(5));
    let db = manager(&connector, policy(3, 10));

    let outcomes = join_all((0..10).map(|_| db.get_connection())).await;

    assert_eq!(connector.calls(), 3);
    let messages: Vec<String> = outcomes
        .into_iter()
        .map(|o| o.unwrap_err().to_string())
        .collect();
    assert!(messages.iter().all(|m| m == &messages[0]));
    assert_eq!(db.status(), PoolStatus::Empty);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_callers_join_in_flight_retries() {
    let connector = MockConnector::new().failing(1);
    let db = manager(&connector, policy(5, 100));

    let first = tokio::spawn({
        let db = Arc::clone(&db);
        async move { db.get_connection().await }
    });
    // Let the first attempt fail and the retry delay start
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(db.status(), PoolStatus::Initializing);

    let late = db.get_connection().await.unwrap();
    let first = first.await.unwrap().unwrap();

    assert_eq!(connector.calls(), 2);
    assert_eq!(first.id, 2);
    assert_eq!(late.id, 2);
}

#[tokio::test]
async fn test_ready_pool_is_reused() {
    let connector = MockConnector::new();
    let db = manager(&connector, policy(5, 10));

    for _ in 0..25 {
        assert_eq!(db.get_connection().await.unwrap().id, 1);
    }
    for _ in 0..5 {
        assert_ok!(db.execute_query("SELECT 1", &[]).await);
    }
    assert_eq!(connector.calls(), 1);
}

#[tokio::test]
async fn test_construction_does_not_connect() {
    let connector = MockConnector::new();
    let db = manager(&connector, policy(5, 10));
    assert_eq!(connector.calls(), 0);
    assert_eq!(db.status(), PoolStatus::Empty);
}

#[tokio::test]
async fn test_parameters_are_passed_positionally() {
    let connector = MockConnector::new().responding(|_, params| {
        Ok(rows(&["id"], vec![vec![match &params[0] {
            SqlParam::Int(n) => salesboard::db::CellValue::Integer(*n),
            other => text(&other.to_string()),
        }]]))
    });
    let db = manager(&connector, policy(5, 10));

    let results = db
        .execute_query("SELECT * FROM t WHERE id = @param0", &[SqlParam::Int(42)])
        .await
        .unwrap();

    assert_eq!(results.row_count, 1);
    let query = connector.last_query();
    assert_eq!(query.sql, "SELECT * FROM t WHERE id = @param0");
    assert_eq!(query.params, vec![SqlParam::Int(42)]);
}

#[tokio::test]
async fn test_placeholder_lookalikes_are_bound_verbatim() {
    let connector = MockConnector::new();
    let db = manager(&connector, policy(5, 10));
    let hostile = "x' OR 1=1 -- @param1";

    db.execute_query(
        "SELECT * FROM t WHERE a = @param0 AND b = @param1",
        &[hostile.into(), "second".into()],
    )
    .await
    .unwrap();

    let query = connector.last_query();
    assert_eq!(query.sql, "SELECT * FROM t WHERE a = @param0 AND b = @param1");
    assert_eq!(
        query.params,
        vec![SqlParam::Text(hostile.into()), SqlParam::Text("second".into())]
    );
}

#[tokio::test]
async fn test_query_failure_keeps_pool() {
    let connector = MockConnector::new()
        .responding(|_, _| Err(DbError::QueryFailed("division by zero".into())));
    let db = manager(&connector, policy(5, 10));

    let err = db.execute_query("SELECT 1/0", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::QueryFailed(_)));
    assert!(!err.is_connection_error());
    assert_eq!(db.status(), PoolStatus::Ready);

    let _ = db.execute_query("SELECT 1/0", &[]).await;
    assert_eq!(connector.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_query_after_exhaustion_reports_connection_error() {
    let connector = MockConnector::new().always_failing();
    let db = manager(&connector, policy(2, 10));

    let err = db.execute_query("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::RetriesExhausted { attempts: 2, .. }));
    assert!(connector.queries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_initialization_continues_after_caller_gives_up() {
    let connector = MockConnector::new().always_failing();
    let db = manager(&connector, policy(5, 100));

    let abandoned = tokio::time::timeout(Duration::from_millis(50), db.get_connection()).await;
    assert!(abandoned.is_err());
    assert_eq!(db.status(), PoolStatus::Initializing);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(connector.calls(), 5);
    assert_eq!(db.status(), PoolStatus::Empty);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_success_still_becomes_ready() {
    let connector = MockConnector::new().failing(2);
    let db = manager(&connector, policy(5, 100));

    let abandoned = tokio::time::timeout(Duration::from_millis(50), db.get_connection()).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(db.status(), PoolStatus::Ready);
    assert_eq!(db.get_connection().await.unwrap().id, 3);
    assert_eq!(connector.calls(), 3);
}

#[tokio::test]
async fn test_disconnected_pool_is_replaced() {
    let connector = MockConnector::new();
    let db = manager(&connector, policy(5, 10));

    let first = db.get_connection().await.unwrap();
    assert_eq!(first.id, 1);
    first.disconnect();

    let second = db.get_connection().await.unwrap();
    assert_eq!(second.id, 2);
    assert_eq!(connector.calls(), 2);
    assert_eq!(db.status(), PoolStatus::Ready);

    // the replacement is cached like any other ready pool
    assert_eq!(db.get_connection().await.unwrap().id, 2);
    assert_eq!(connector.calls(), 2);
}
