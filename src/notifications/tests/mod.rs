//! Event bus test suites

mod subscription;

use crate::notifications::api::{
    Event, EventFilter, HandlerError, HostEvent, Subscriber, SubscriberStatistics,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// What a test subscriber does when it receives an event
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Behaviour {
    Accept,
    Fail,
    Panic,
    /// Accept after sleeping this many milliseconds
    Slow(u64),
}

/// Subscriber that records the kind of every event it handles
pub(super) struct RecordingSubscriber {
    id: String,
    filter: EventFilter,
    behaviour: Behaviour,
    live: AtomicBool,
    received: Mutex<Vec<String>>,
    stats: SubscriberStatistics,
}

impl RecordingSubscriber {
    pub(super) fn new(id: &str, filter: EventFilter, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            filter,
            behaviour,
            live: AtomicBool::new(true),
            received: Mutex::new(Vec::new()),
            stats: SubscriberStatistics::new(),
        })
    }

    pub(super) fn accepting(id: &str) -> Arc<Self> {
        Self::new(id, EventFilter::All, Behaviour::Accept)
    }

    pub(super) fn retire(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    pub(super) fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
    async fn handle_event(&self, event: &Event) -> Result<(), HandlerError> {
        let label = match event {
            Event::Host(host) => host.topic.clone(),
            other => other.kind().to_string(),
        };
        self.received.lock().unwrap().push(label);

        match self.behaviour {
            Behaviour::Accept => Ok(()),
            Behaviour::Fail => Err(format!("{} refused the event", self.id).into()),
            Behaviour::Panic => panic!("{} blew up", self.id),
            Behaviour::Slow(millis) => {
                tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
                Ok(())
            }
        }
    }

    fn subscriber_id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &str {
        "notification-tests"
    }

    fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn get_statistics(&self) -> &SubscriberStatistics {
        &self.stats
    }
}

pub(super) fn host_event(topic: &str) -> Event {
    Event::Host(HostEvent::new(topic, serde_json::json!({ "topic": topic })))
}
