mod common;

use common::{next_event, quiet, TestHub};
use serde_json::json;
use state_hub::{Event, Source};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn telemetry_is_stored_and_delivered_back_to_sender() {
    let hub = TestHub::start().await;
    let (mut a, hello) = hub.connect().await;

    match hello {
        Event::Hello { data_snapshot, message, .. } => {
            assert_eq!(message, "connected");
            assert!(data_snapshot.is_empty());
        }
        other => panic!("expected hello, got {other:?}"),
    }

    a.send_json(&json!({"type": "telemetry", "device_id": "t1", "value": 23.5}))
        .await
        .unwrap();

    match next_event(&mut a).await {
        Some(Event::DataUpdate { device_id, value, source, .. }) => {
            assert_eq!(device_id, "t1");
            assert_eq!(value, json!(23.5));
            assert_eq!(source, Source::Stream);
        }
        other => panic!("expected data_update, got {other:?}"),
    }

    let record = hub.state.hub.store().get("t1").expect("t1 stored");
    assert_eq!(record.value, json!(23.5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hello_carries_existing_state() {
    let hub = TestHub::start().await;
    hub.state.hub.store().put("t0", json!({"temp": 21})).unwrap();

    let (_client, hello) = hub.connect().await;
    match hello {
        Event::Hello { data_snapshot, .. } => {
            assert_eq!(data_snapshot["t0"].value, json!({"temp": 21}));
        }
        other => panic!("expected hello, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn protocol_violation_keeps_connection_open() {
    let hub = TestHub::start().await;
    let (mut a, _) = hub.connect().await;

    a.send_json(&json!({"type": "telemetry", "value": 1})).await.unwrap();
    match next_event(&mut a).await {
        Some(Event::Error { message, .. }) => assert_eq!(message, "telemetry missing device_id"),
        other => panic!("expected error, got {other:?}"),
    }

    a.send_json(&json!({"type": "ping"})).await.unwrap();
    assert!(matches!(next_event(&mut a).await, Some(Event::Pong { .. })));
    assert!(quiet(&mut a).await.is_none());
    assert_eq!(hub.state.hub.store().count(), 0);
}
