// Integration tests for the lock coordinator
// Exercises fairness, timeout, and administrative behavior through the
// public API only

use std::sync::Arc;
use std::time::Duration;

use tranca_common::{LockMode, TrancaError};
use tranca_core::model::LockSummary;
use tranca_core::service::audit::AuditService;
use tranca_core::service::lock::{LockService, LockServiceConfig};

fn service() -> Arc<LockService> {
    Arc::new(LockService::new(Arc::new(AuditService::new(128))))
}

fn service_with_timeout(timeout_ms: u64) -> Arc<LockService> {
    Arc::new(LockService::with_config(
        Arc::new(AuditService::new(128)),
        LockServiceConfig {
            acquire_timeout: Duration::from_millis(timeout_ms),
        },
    ))
}

#[tokio::test]
async fn test_grant_order_is_arrival_order() {
    let svc = service();

    svc.acquire_write("orders", "w1").await.unwrap();

    // Enqueue write, then read, then read, with deterministic arrival order
    let mut handles = Vec::new();
    for (session, mode) in [
        ("w2", LockMode::Write),
        ("r3", LockMode::Read),
        ("r4", LockMode::Read),
    ] {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            match mode {
                LockMode::Read => svc.acquire_read("orders", session).await,
                LockMode::Write => svc.acquire_write("orders", session).await,
            }
        }));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let pending = svc.pending_queue();
    assert_eq!(pending.len(), 3);
    assert_eq!(pending[0].session, "w2");
    assert_eq!(pending[1].session, "r3");
    assert_eq!(pending[2].session, "r4");

    svc.release("orders", "w1");
    tokio::time::sleep(Duration::from_millis(20)).await;

    // w2 alone is granted first, the reads stay parked behind it
    let locks = svc.active_locks();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].session, "w2");
    assert_eq!(svc.pending_queue().len(), 2);

    svc.release("orders", "w2");
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Both reads now hold the resource concurrently
    let locks = svc.active_locks();
    assert_eq!(locks.len(), 2);
    assert!(locks.iter().all(|l| l.mode == LockMode::Read));
}

#[tokio::test]
async fn test_contended_writers_serialize() {
    let svc = service();
    let mut handles = Vec::new();

    for i in 0..4 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            let session = format!("w{}", i);
            svc.acquire_write("counter", &session).await.unwrap();
            // At most one writer may be active at any observable instant
            let writers = svc
                .active_locks()
                .iter()
                .filter(|l| l.resource == "counter" && l.mode == LockMode::Write)
                .count();
            assert_eq!(writers, 1);
            tokio::time::sleep(Duration::from_millis(10)).await;
            svc.release("counter", &session);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert!(svc.active_locks().is_empty());
    assert!(svc.pending_queue().is_empty());
}

#[tokio::test]
async fn test_timeout_is_bounded() {
    let svc = service_with_timeout(150);

    svc.acquire_write("orders", "holder").await.unwrap();

    let started = std::time::Instant::now();
    let err = svc.acquire_write("orders", "waiter").await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, TrancaError::LockTimeout { .. }));
    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed < Duration::from_millis(1000), "timer fired far too late");
    assert!(svc.pending_queue().is_empty());
}

#[tokio::test]
async fn test_force_unlock_then_resource_is_reusable() {
    let svc = service();

    svc.acquire_write("orders", "w1").await.unwrap();
    let blocked = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.acquire_read("orders", "r2").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    svc.force_unlock("orders").unwrap();
    assert!(matches!(
        blocked.await.unwrap(),
        Err(TrancaError::LockCancelled { .. })
    ));

    // A fresh acquisition starts from a clean record
    svc.acquire_write("orders", "w3").await.unwrap();
    let locks = svc.active_locks();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].session, "w3");
}

#[tokio::test]
async fn test_simulated_hold_releases_without_caller() {
    let svc = service();

    let session = LockService::simulate_write(&svc, "orders", Duration::from_millis(80));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(svc.active_locks().len(), 1);

    let waiter = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.acquire_read("orders", "r1").await })
    };
    waiter.await.unwrap().unwrap();

    let log = svc.recent_log();
    assert!(log.iter().any(|line| line.contains(&session)));
    svc.release("orders", "r1");
}

#[tokio::test]
async fn test_status_summary_counts() {
    let svc = service();

    svc.acquire_read("orders", "r1").await.unwrap();
    svc.acquire_read("orders", "r2").await.unwrap();
    svc.acquire_write("users", "w1").await.unwrap();

    let locks = svc.active_locks();
    let summary = LockSummary::of_active(&locks);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.readers, 2);
    assert_eq!(summary.writers, 1);
    assert_eq!(summary.resources, 2);
}

#[tokio::test]
async fn test_independent_resources_do_not_interfere() {
    let svc = service();

    svc.acquire_write("orders", "w1").await.unwrap();
    // A writer on one resource never delays another resource
    svc.acquire_write("users", "w2").await.unwrap();
    svc.acquire_read("inventory", "r1").await.unwrap();

    assert_eq!(svc.active_locks().len(), 3);
    assert!(svc.pending_queue().is_empty());
}
