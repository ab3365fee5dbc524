use common::{channel::ChannelId, position::FusedFix};
use module_core::{
    test_helper::{collect_events, wait_for_event},
    *,
};
use std::{sync::Arc, time::Duration};

#[tokio::test]
#[test_log::test]
pub async fn events_delivered() {
    let event_bus = EventBus::new();
    let mut receiver = event_bus.subscribe();
    let event = Event {
        kind: EventKind::QuitEvent,
    };
    event_bus.publish(&event);
    let received_event = tokio::time::timeout(Duration::from_millis(100), receiver.recv())
        .await
        .expect("Failed to receive event in required time")
        .unwrap();
    assert_eq!(received_event.event_type(), event.event_type());
}

#[tokio::test]
#[test_log::test]
pub async fn wait_skips_other_events() {
    let event_bus = EventBus::new();
    let ctx = event_bus.context();
    let mut receiver = event_bus.subscribe();
    let fused = FusedFix {
        latitude: 40.01,
        longitude: 11.1,
        heading: None,
    };
    ctx.publish_event(EventKind::PersistenceFailureEvent(ChannelId::B))
        .expect("Failed to publish persistence failure");
    ctx.publish_event(EventKind::FusedFixEvent(Arc::new(fused)))
        .expect("Failed to publish fused fix");

    let event = wait_for_event(
        &mut receiver,
        Duration::from_millis(100),
        EventKindType::FusedFixEvent,
    )
    .await;
    assert_eq!(
        payload_ref!(event.kind, EventKind::FusedFixEvent).map(|f| **f),
        Some(fused)
    );
}

#[tokio::test]
#[test_log::test]
pub async fn collect_only_requested_events() {
    let event_bus = EventBus::new();
    let mut receiver = event_bus.subscribe();
    for channel in ChannelId::ALL {
        event_bus.publish(&Event {
            kind: EventKind::PersistenceFailureEvent(channel),
        });
        event_bus.publish(&Event {
            kind: EventKind::ReplayCompleteEvent,
        });
    }

    let events = collect_events(
        &mut receiver,
        Duration::from_millis(50),
        EventKindType::PersistenceFailureEvent,
    )
    .await;
    let channels: Vec<ChannelId> = events
        .iter()
        .filter_map(|e| payload_ref!(e.kind, EventKind::PersistenceFailureEvent).copied())
        .collect();
    assert_eq!(channels, ChannelId::ALL.to_vec());
}

#[tokio::test]
#[test_log::test]
pub async fn wait_for_quit_skips_other_events() {
    let event_bus = EventBus::new();
    let mut ctx = event_bus.context();
    event_bus.publish(&Event {
        kind: EventKind::ReplayCompleteEvent,
    });
    event_bus.publish(&Event {
        kind: EventKind::QuitEvent,
    });

    tokio::time::timeout(Duration::from_millis(100), ctx.wait_for_quit())
        .await
        .expect("Quit event not detected");
}

#[tokio::test]
#[test_log::test]
pub async fn keep_waiting_for_quit_without_quit_event() {
    let event_bus = EventBus::new();
    let mut ctx = event_bus.context();
    event_bus.publish(&Event {
        kind: EventKind::PersistenceFailureEvent(ChannelId::A),
    });

    let waited = tokio::time::timeout(Duration::from_millis(50), ctx.wait_for_quit()).await;
    assert!(waited.is_err());
}

#[test]
pub fn publish_without_subscriber_fails() {
    let ctx = {
        let event_bus = EventBus::new();
        let mut ctx = event_bus.context();
        let (sender, receiver) = tokio::sync::broadcast::channel(1);
        drop(receiver);
        ctx.sender = sender;
        ctx
    };
    assert!(ctx.publish_event(EventKind::QuitEvent).is_err());
}
