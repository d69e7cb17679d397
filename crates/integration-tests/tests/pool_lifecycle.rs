//! Integration tests for the connection pool lifecycle and identity isolation.
//!
//! Tests in the first section need no database. The rest require a seeded
//! `PostgreSQL` database at `ZAVA_TEST_DATABASE_URL`.

use std::sync::Arc;
use std::time::Duration;

use sqlx::Connection;
use uuid::Uuid;
use zava_core::{ProductMatch, RlsUserId, SearchRequest};
use zava_integration_tests::{
    direct_connection, manager_service, seeded_store_identities, single_connection_config,
    test_config, unreachable_config,
};
use zava_sales::db::current_identity;
use zava_sales::{Checkout, PoolManager, ProductSearchService, SalesError, check_connection};

// ============================================================================
// Lifecycle Without a Database
// ============================================================================

#[tokio::test]
async fn test_search_before_create_pool_fails_with_envelope() {
    let service = ProductSearchService::new(PoolManager::new(unreachable_config()));

    let text = service.get_products_by_name("paint", 20, "").await;
    let json: serde_json::Value = serde_json::from_str(&text).expect("Envelope is not JSON");

    let error = json["error"].as_str().expect("error field missing");
    assert!(error.contains("create_pool()"));
    assert_eq!(json["row_count"], 0);
}

#[tokio::test]
async fn test_close_is_idempotent_without_pool() {
    let service = ProductSearchService::new(PoolManager::new(unreachable_config()));

    service.close_pool().await;
    service.close_pool().await;

    assert!(!service.pool().is_initialized().await);
}

#[tokio::test]
async fn test_create_pool_against_unreachable_store() {
    let service = ProductSearchService::new(PoolManager::new(unreachable_config()));

    let result = service.create_pool().await;
    assert!(matches!(result, Err(SalesError::ConnectionSetup(_))));

    // Still usable afterwards: searches report the missing pool
    let result = service.search(&SearchRequest::new("paint", 5, "")).await;
    assert!(matches!(result, Err(SalesError::PoolNotInitialized)));
}

#[tokio::test]
async fn test_check_connection_against_unreachable_store() {
    let result = check_connection(&unreachable_config()).await;
    assert!(matches!(result, Err(SalesError::ConnectionSetup(_))));
}

// ============================================================================
// Lifecycle Against a Database
// ============================================================================

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_check_connection_succeeds() {
    check_connection(&test_config(1, 3))
        .await
        .expect("Connection check failed");
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_create_pool_is_idempotent() {
    let service = manager_service().await;

    service.create_pool().await.expect("Second create_pool failed");
    let status = service.pool().status().await.expect("Pool not initialized");
    assert_eq!(status.max_size, 3);

    service.close_pool().await;
    service.close_pool().await;
    assert!(!service.pool().is_initialized().await);
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_search_after_close_reports_missing_pool() {
    let service = manager_service().await;
    service.close_pool().await;

    let result = service.search(&SearchRequest::new("paint", 5, "")).await;
    assert!(matches!(result, Err(SalesError::PoolNotInitialized)));
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_session_settings_are_applied() {
    let service = manager_service().await;

    let mut checkout = service.pool().acquire().await.expect("Acquire failed");
    let (jit, work_mem, statement_timeout): (String, String, String) = sqlx::query_as(
        "SELECT current_setting('jit'), current_setting('work_mem'), current_setting('statement_timeout')",
    )
    .fetch_one(checkout.connection())
    .await
    .expect("Reading settings failed");
    service.pool().release(checkout);

    assert_eq!(jit, "off");
    assert_eq!(work_mem, "4MB");
    assert_eq!(statement_timeout, "30s");

    service.close_pool().await;
}

// ============================================================================
// Identity Isolation
// ============================================================================

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_identity_is_rebound_on_reused_connection() {
    // One connection, so every search reuses it
    let service = ProductSearchService::new(PoolManager::new(test_config(1, 1)));
    service.create_pool().await.expect("Failed to create pool");

    let store = RlsUserId::new(Uuid::new_v4().to_string());

    service
        .search(&SearchRequest::new("paint", 5, store.clone()))
        .await
        .expect("Store search failed");
    {
        let mut checkout = service.pool().acquire().await.expect("Acquire failed");
        let bound = current_identity(checkout.connection())
            .await
            .expect("Reading identity failed");
        service.pool().release(checkout);
        assert_eq!(bound, Some(store));
    }

    service
        .search(&SearchRequest::new("paint", 5, RlsUserId::manager()))
        .await
        .expect("Manager search failed");
    {
        let mut checkout = service.pool().acquire().await.expect("Acquire failed");
        let bound = current_identity(checkout.connection())
            .await
            .expect("Reading identity failed");
        service.pool().release(checkout);
        assert_eq!(bound, Some(RlsUserId::manager()));
    }

    service.close_pool().await;
}

fn stock(rows: &[ProductMatch]) -> i64 {
    rows.iter().map(|p| p.total_stock).sum()
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_alternating_identities_on_one_connection_see_their_own_rows() {
    // One connection, so a stale binding would leak into the next search
    let service = ProductSearchService::new(PoolManager::new(test_config(1, 1)));
    service.create_pool().await.expect("Failed to create pool");

    let stores = seeded_store_identities(2).await;
    let [store_a, store_b] = stores.as_slice() else {
        panic!("seeded database should have at least two stores");
    };

    let search = |identity: RlsUserId| {
        let service = &service;
        async move {
            service
                .search(&SearchRequest::new("paint", 100, identity))
                .await
                .expect("Search failed")
        }
    };

    let manager = search(RlsUserId::manager()).await;
    let as_a = search(store_a.clone()).await;
    let as_b = search(store_b.clone()).await;
    let manager_again = search(RlsUserId::manager()).await;
    let as_a_again = search(store_a.clone()).await;

    // Each store sees strictly less than the manager right after a manager search
    assert!(stock(&as_a) < stock(&manager), "store A saw manager's rows");
    assert!(stock(&as_b) < stock(&manager), "store B saw manager's rows");
    assert!(as_a.len() <= manager.len());
    assert!(as_b.len() <= manager.len());

    // Switching back restores exactly the earlier view
    assert_eq!(manager_again, manager);
    assert_eq!(as_a_again, as_a);

    service.close_pool().await;
}

// ============================================================================
// Failure Paths
// ============================================================================

/// Backend process id of a checked-out connection.
async fn backend_pid(checkout: &mut Checkout) -> i32 {
    sqlx::query_scalar("SELECT pg_backend_pid()")
        .fetch_one(checkout.connection())
        .await
        .expect("Reading backend pid failed")
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_acquire_times_out_while_only_connection_is_held() {
    let config = single_connection_config(Duration::from_secs(1), Duration::from_secs(30));
    let service = ProductSearchService::new(PoolManager::new(config));
    service.create_pool().await.expect("Failed to create pool");

    let held = service.pool().acquire().await.expect("Acquire failed");

    let result = service.search(&SearchRequest::new("paint", 5, "")).await;
    assert!(matches!(result, Err(SalesError::PoolExhausted(_))));

    let text = service.get_products_by_name("paint", 5, "").await;
    let json: serde_json::Value = serde_json::from_str(&text).expect("Envelope is not JSON");
    let error = json["error"].as_str().expect("error field missing");
    assert!(error.contains("connection pool exhausted"));

    service.pool().release(held);

    service
        .search(&SearchRequest::new("paint", 5, ""))
        .await
        .expect("Search after release failed");

    service.close_pool().await;
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_statement_timeout_is_a_query_failure() {
    let config = single_connection_config(Duration::from_secs(10), Duration::from_secs(1));
    let service = ProductSearchService::new(PoolManager::new(config));
    service.create_pool().await.expect("Failed to create pool");

    let mut locker = direct_connection().await;
    let mut tx = locker.begin().await.expect("Begin failed");
    sqlx::query("LOCK TABLE retail.inventory IN ACCESS EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await
        .expect("Lock failed");

    let result = service.search(&SearchRequest::new("paint", 5, "")).await;
    let Err(err) = result else {
        panic!("search should fail while inventory is locked");
    };
    assert!(matches!(err, SalesError::QueryExecution(_)));
    assert!(!err.poisons_connection());

    let text = service.get_products_by_name("paint", 5, "").await;
    let json: serde_json::Value = serde_json::from_str(&text).expect("Envelope is not JSON");
    let error = json["error"].as_str().expect("error field missing");
    assert!(error.starts_with("PostgreSQL query failed: "));
    assert!(error.contains("statement timeout"));

    tx.rollback().await.expect("Rollback failed");

    service
        .search(&SearchRequest::new("paint", 5, ""))
        .await
        .expect("Search after unlock failed");

    service.close_pool().await;
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_command_timeout_discards_the_connection() {
    let config = single_connection_config(Duration::from_secs(1), Duration::from_secs(30));
    let service = ProductSearchService::new(PoolManager::new(config));
    service.create_pool().await.expect("Failed to create pool");

    let pid_before = {
        let mut checkout = service.pool().acquire().await.expect("Acquire failed");
        let pid = backend_pid(&mut checkout).await;
        service.pool().release(checkout);
        pid
    };

    let mut locker = direct_connection().await;
    let mut tx = locker.begin().await.expect("Begin failed");
    sqlx::query("LOCK TABLE retail.inventory IN ACCESS EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await
        .expect("Lock failed");

    let result = service.search(&SearchRequest::new("paint", 5, "")).await;
    assert!(matches!(result, Err(SalesError::CommandTimeout { .. })));

    tx.rollback().await.expect("Rollback failed");

    let text = service.get_products_by_name("paint", 5, "").await;
    let json: serde_json::Value = serde_json::from_str(&text).expect("Envelope is not JSON");
    assert!(json.get("error").is_none(), "pool did not recover: {text}");

    let status = service.pool().status().await.expect("Pool not initialized");
    assert!(status.size <= 1);

    let pid_after = {
        let mut checkout = service.pool().acquire().await.expect("Acquire failed");
        let pid = backend_pid(&mut checkout).await;
        service.pool().release(checkout);
        pid
    };
    assert_ne!(pid_before, pid_after, "timed-out connection was reused");

    service.close_pool().await;
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_rejected_identity_releases_the_connection() {
    let service = ProductSearchService::new(PoolManager::new(test_config(1, 1)));
    service.create_pool().await.expect("Failed to create pool");

    // The store rejects NUL bytes in text values
    let result = service.search(&SearchRequest::new("paint", 5, "a\0b")).await;
    let Err(err) = result else {
        panic!("identity with a NUL byte should be rejected");
    };
    assert!(matches!(err, SalesError::IdentityBind(_)));
    assert_eq!(err.category(), "identity_bind");

    let text = service.get_products_by_name("paint", 5, "a\0b").await;
    let json: serde_json::Value = serde_json::from_str(&text).expect("Envelope is not JSON");
    let error = json["error"].as_str().expect("error field missing");
    assert!(error.contains("failed to bind row-level security identity"));
    assert_eq!(json["results"], serde_json::json!([]));

    // Size-1 pool: this only succeeds if the connection came back
    service
        .search(&SearchRequest::new("paint", 5, ""))
        .await
        .expect("Search after rejected identity failed");

    service.close_pool().await;
}

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_broken_checkout_is_not_reused() {
    let service = ProductSearchService::new(PoolManager::new(test_config(1, 1)));
    service.create_pool().await.expect("Failed to create pool");

    let mut checkout = service.pool().acquire().await.expect("Acquire failed");
    let pid_before = backend_pid(&mut checkout).await;
    checkout.mark_broken();
    assert!(checkout.is_broken());
    service.pool().release(checkout);

    let mut checkout = service.pool().acquire().await.expect("Acquire failed");
    let pid_after = backend_pid(&mut checkout).await;
    assert!(!checkout.is_broken());
    service.pool().release(checkout);

    assert_ne!(pid_before, pid_after);

    service.close_pool().await;
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
#[ignore = "requires seeded PostgreSQL (ZAVA_TEST_DATABASE_URL)"]
async fn test_concurrent_searches_return_every_connection() {
    let service = Arc::new(manager_service().await);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let identity = if i % 2 == 0 {
                    String::new()
                } else {
                    Uuid::new_v4().to_string()
                };
                service
                    .search(&SearchRequest::new("paint", 10, identity))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let result = handle.await.expect("Task panicked");
        assert!(result.is_ok(), "Concurrent search failed: {result:?}");
    }

    // Dropped connections go back to the pool on a background task
    let mut status = service.pool().status().await.expect("Pool not initialized");
    for _ in 0..50 {
        if status.available() == status.max_size {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        status = service.pool().status().await.expect("Pool not initialized");
    }
    assert!(status.size <= status.max_size);
    assert_eq!(status.available(), status.max_size);

    service.close_pool().await;
}
