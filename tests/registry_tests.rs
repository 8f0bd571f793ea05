mod common;

use std::sync::{Arc, atomic::Ordering};

use anyhow::Result;
use common::MockStore;
use notification_service::broadcast::{BroadcastEvent, ConnectionRegistry};
use serde_json::json;

fn registry(store: &Arc<MockStore>) -> ConnectionRegistry {
    ConnectionRegistry::new(store.clone())
}

/// Test: every registered connection receives a broadcast
#[tokio::test]
async fn test_broadcast_reaches_all_connections() -> Result<()> {
    let store = MockStore::new();
    let registry = registry(&store);

    let (_id_a, mut rx_a) = registry.subscribe();
    let (_id_b, mut rx_b) = registry.subscribe();

    let delivered = registry
        .broadcast(BroadcastEvent::new("order", json!("order #42 placed")))
        .await;

    assert_eq!(delivered, 2);

    let event_a = rx_a.recv().await.unwrap();
    let event_b = rx_b.recv().await.unwrap();
    assert_eq!(event_a.kind, "order");
    assert_eq!(event_b.message, json!("order #42 placed"));

    Ok(())
}

/// Test: a removed connection no longer receives broadcasts
#[tokio::test]
async fn test_removed_connection_is_skipped() -> Result<()> {
    let store = MockStore::new();
    let registry = registry(&store);

    let (id_a, mut rx_a) = registry.subscribe();
    let (_id_b, mut rx_b) = registry.subscribe();

    registry.remove(id_a);
    assert_eq!(registry.len(), 1);

    let delivered = registry
        .broadcast(BroadcastEvent::new("order", json!("hello")))
        .await;

    assert_eq!(delivered, 1);
    assert!(rx_b.recv().await.is_some());
    assert!(rx_a.recv().await.is_none(), "sender side must be dropped");

    Ok(())
}

/// Test: connections whose receiver went away are pruned during broadcast
#[tokio::test]
async fn test_dead_connections_are_pruned() -> Result<()> {
    let store = MockStore::new();
    let registry = registry(&store);

    let (_id, rx) = registry.subscribe();
    drop(rx);

    let delivered = registry
        .broadcast(BroadcastEvent::new("order", json!("hello")))
        .await;

    assert_eq!(delivered, 0);
    assert!(registry.is_empty());

    Ok(())
}

/// Test: each broadcast records one admin notification
#[tokio::test]
async fn test_broadcast_persists_admin_record() -> Result<()> {
    let store = MockStore::new();
    let registry = registry(&store);

    let (_id, _rx) = registry.subscribe();

    registry
        .broadcast(BroadcastEvent::new("order", json!("order #42 placed")))
        .await;

    let records = store.admin_notifications.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "New Message");
    assert_eq!(records[0].description, "order #42 placed");
    assert_eq!(records[0].kind, "order");

    Ok(())
}

/// Test: a failing feed write is swallowed and does not affect delivery
#[tokio::test]
async fn test_feed_write_failure_is_best_effort() -> Result<()> {
    let store = MockStore::new();
    store.fail_admin_writes.store(true, Ordering::SeqCst);

    let registry = registry(&store);
    let (_id, mut rx) = registry.subscribe();

    let delivered = registry
        .broadcast(BroadcastEvent::new("order", json!("hello")))
        .await;

    assert_eq!(delivered, 1);
    assert!(rx.recv().await.is_some());

    Ok(())
}

/// Test: structured payloads are persisted as their JSON rendering
#[tokio::test]
async fn test_structured_payload_description() -> Result<()> {
    let store = MockStore::new();
    let registry = registry(&store);

    registry
        .broadcast(BroadcastEvent::new(
            "order",
            json!({ "orderId": "o-1", "total": 120 }),
        ))
        .await;

    let records = store.admin_notifications.lock().unwrap();
    assert_eq!(records[0].description, r#"{"orderId":"o-1","total":120}"#);

    Ok(())
}
