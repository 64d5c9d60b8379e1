//! Subscribe/unsubscribe bookkeeping

use super::RecordingSubscriber;
use crate::notifications::api::EventBus;

#[test]
fn test_subscribe_keeps_order() {
    let bus = EventBus::new();
    assert!(bus.subscribe(RecordingSubscriber::accepting("first")));
    assert!(bus.subscribe(RecordingSubscriber::accepting("second")));

    assert_eq!(bus.subscriber_count(), 2);
    assert_eq!(bus.subscriber_ids(), vec!["first", "second"]);
}

#[test]
fn test_duplicate_subscriber_id_is_rejected() {
    let bus = EventBus::new();
    assert!(bus.subscribe(RecordingSubscriber::accepting("same")));
    assert!(!bus.subscribe(RecordingSubscriber::accepting("same")));
    assert_eq!(bus.subscriber_count(), 1);
}

#[test]
fn test_unsubscribe_returns_subscriber() {
    let bus = EventBus::new();
    bus.subscribe(RecordingSubscriber::accepting("gone"));

    let removed = bus.unsubscribe("gone");
    assert!(removed.is_some());
    assert_eq!(removed.unwrap().subscriber_id(), "gone");
    assert!(!bus.has_subscriber("gone"));
    assert!(bus.unsubscribe("gone").is_none());
}

#[tokio::test]
async fn test_unsubscribed_subscriber_receives_nothing() {
    let bus = EventBus::new();
    let subscriber = RecordingSubscriber::accepting("listener");
    bus.subscribe(subscriber.clone());
    bus.unsubscribe("listener");

    let report = bus.publish(super::host_event("late")).await;
    assert_eq!(report.delivered, 0);
    assert!(subscriber.received().is_empty());
}

#[tokio::test]
async fn test_subscriber_statistics_are_tracked() {
    let bus = EventBus::new();
    bus.subscribe(RecordingSubscriber::accepting("counted"));

    bus.publish(super::host_event("one")).await;
    bus.publish(super::host_event("two")).await;

    assert_eq!(bus.subscriber_statistics("counted"), Some((2, 0)));
    assert_eq!(bus.subscriber_statistics("unknown"), None);
}

#[tokio::test]
async fn test_publisher_does_not_keep_bus_alive() {
    let bus = std::sync::Arc::new(EventBus::new());
    let publisher = bus.publisher();
    assert!(publisher.publish(super::host_event("alive")).await.is_some());

    drop(bus);
    assert!(publisher.publish(super::host_event("dead")).await.is_none());
    assert!(publisher.publish_async(super::host_event("dead")).is_none());
}
