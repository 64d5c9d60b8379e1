//! Plugin Test Utilities
//!
//! Mock plugins, loader contexts and discovery shared by the plugin test suites.

use crate::notifications::api::{
    Event, EventBus, EventFilter, HandlerError, Subscriber, SubscriberStatistics,
};
use crate::plugin::context::PluginContext;
use crate::plugin::discovery::{DiscoveryScope, DiscoveryService, PluginFactory};
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::external::api::DESCRIPTOR_RESOURCE;
use crate::plugin::loader::{ContextProvider, LoaderContext};
use crate::plugin::manager::PluginManager;
use crate::plugin::settings::ManagerConfig;
use crate::plugin::traits::Plugin;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered record of hook invocations shared by mock plugins
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// How a mock hook misbehaves
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Failure {
    #[default]
    None,
    Error,
    Panic,
}

/// Configurable mock plugin; cloning yields a new, distinct instance
#[derive(Clone)]
pub struct MockPlugin {
    pub name: String,
    journal: Journal,
    construct: Failure,
    create: Failure,
    destroy: Failure,
    event: Failure,
    event_delay: Option<Duration>,
    filter: EventFilter,
}

impl MockPlugin {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            construct: Failure::None,
            create: Failure::None,
            destroy: Failure::None,
            event: Failure::None,
            event_delay: None,
            filter: EventFilter::All,
        }
    }

    /// Shared handle, ready for `add_plugin`
    pub fn shared(name: &str, journal: &Journal) -> Arc<dyn Plugin> {
        Arc::new(Self::new(name, journal))
    }

    pub fn failing_construct(mut self) -> Self {
        self.construct = Failure::Panic;
        self
    }

    pub fn failing_create(mut self, failure: Failure) -> Self {
        self.create = failure;
        self
    }

    pub fn failing_destroy(mut self, failure: Failure) -> Self {
        self.destroy = failure;
        self
    }

    pub fn failing_events(mut self, failure: Failure) -> Self {
        self.event = failure;
        self
    }

    pub fn slow_events(mut self, delay: Duration) -> Self {
        self.event_delay = Some(delay);
        self
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }

    fn fail(&self, failure: Failure, operation: &str) -> PluginResult<()> {
        match failure {
            Failure::None => Ok(()),
            Failure::Error => Err(PluginError::execution(&self.name, operation, "mock failure")),
            Failure::Panic => panic!("{} panicked in {}", self.name, operation),
        }
    }
}

#[async_trait]
impl Plugin for MockPlugin {
    fn plugin_name(&self) -> &str {
        &self.name
    }

    fn event_filter(&self) -> EventFilter {
        self.filter.clone()
    }

    async fn on_create(&self, context: &PluginContext) -> PluginResult<()> {
        self.record(format!(
            "create:{}@{}",
            self.name,
            context.bundle().unwrap_or("host")
        ));
        self.fail(self.create, "on_create")
    }

    async fn on_destroy(&self) -> PluginResult<()> {
        self.record(format!("destroy:{}", self.name));
        self.fail(self.destroy, "on_destroy")
    }

    async fn handle_event(&self, event: &Event) -> PluginResult<()> {
        if let Some(delay) = self.event_delay {
            tokio::time::sleep(delay).await;
        }
        self.record(format!("event:{}:{}", self.name, event_label(event)));
        self.fail(self.event, "handle_event")
    }
}

/// Short label of an event: `Added:a1`, `Loaded:A`, `Shutdown`, or the host topic
pub fn event_label(event: &Event) -> String {
    match event {
        Event::Plugin(e) => format!("{:?}:{}", e.event_type, e.plugin_name),
        Event::Bundle(e) => format!("{:?}:{}", e.event_type, e.bundle_name),
        Event::System(e) => format!("{:?}", e.event_type),
        Event::Host(e) => e.topic.clone(),
    }
}

/// Counts what happened to the loader contexts of one provider
#[derive(Debug, Default)]
pub struct ContextCounters {
    opened: AtomicUsize,
    released: AtomicUsize,
    leaked: AtomicUsize,
}

impl ContextCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn leaked(&self) -> usize {
        self.leaked.load(Ordering::SeqCst)
    }

    /// Contexts opened but neither released nor leaked
    pub fn outstanding(&self) -> usize {
        self.opened() - self.released() - self.leaked()
    }
}

/// Contents of a mock bundle
#[derive(Clone)]
pub struct MockBundle {
    descriptor: Option<String>,
    plugins: Vec<MockPlugin>,
}

impl MockBundle {
    pub fn named(name: &str) -> Self {
        Self {
            descriptor: Some(serde_json::json!({ "name": name, "version": "1.0.0" }).to_string()),
            plugins: Vec::new(),
        }
    }

    pub fn without_descriptor() -> Self {
        Self {
            descriptor: None,
            plugins: Vec::new(),
        }
    }

    pub fn with_raw_descriptor(raw: &str) -> Self {
        Self {
            descriptor: Some(raw.to_string()),
            plugins: Vec::new(),
        }
    }

    pub fn with_plugin(mut self, plugin: MockPlugin) -> Self {
        self.plugins.push(plugin);
        self
    }
}

pub struct MockLoaderContext {
    location: String,
    bundle: MockBundle,
    counters: Arc<ContextCounters>,
}

impl LoaderContext for MockLoaderContext {
    fn location(&self) -> &str {
        &self.location
    }

    fn resource(&self, name: &str) -> PluginResult<Option<Vec<u8>>> {
        if name == DESCRIPTOR_RESOURCE {
            return Ok(self.bundle.descriptor.as_ref().map(|d| d.as_bytes().to_vec()));
        }
        Ok(None)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn release(self: Box<Self>) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }

    fn leak(self: Box<Self>) {
        self.counters.leaked.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves mock bundles by location
#[derive(Default)]
pub struct MockContextProvider {
    bundles: Mutex<HashMap<String, MockBundle>>,
    pub counters: Arc<ContextCounters>,
}

impl MockContextProvider {
    pub fn add_bundle(&self, location: &str, bundle: MockBundle) {
        self.bundles
            .lock()
            .unwrap()
            .insert(location.to_string(), bundle);
    }
}

impl ContextProvider for MockContextProvider {
    fn open(&self, location: &str) -> PluginResult<Box<dyn LoaderContext>> {
        let bundle = self
            .bundles
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| PluginError::ContextOpenFailed {
                location: location.to_string(),
                cause: "no such mock bundle".to_string(),
            })?;

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockLoaderContext {
            location: location.to_string(),
            bundle,
            counters: self.counters.clone(),
        }))
    }
}

fn factory_for(template: &MockPlugin) -> PluginFactory {
    let template = template.clone();
    PluginFactory::new(format!("mock::{}", template.name), move || {
        if template.construct == Failure::Panic {
            panic!("cannot construct {}", template.name);
        }
        Arc::new(template.clone()) as Arc<dyn Plugin>
    })
}

/// Discovery over mock bundles plus a fixed list of process-wide plugins
#[derive(Default)]
pub struct MockDiscovery {
    pub process: Vec<MockPlugin>,
    pub fail_process: bool,
}

impl DiscoveryService for MockDiscovery {
    fn find_implementations(&self, scope: DiscoveryScope<'_>) -> PluginResult<Vec<PluginFactory>> {
        match scope {
            DiscoveryScope::Process => {
                if self.fail_process {
                    return Err(PluginError::DiscoveryFailed {
                        cause: "mock discovery offline".to_string(),
                    });
                }
                Ok(self.process.iter().map(factory_for).collect())
            }
            DiscoveryScope::Bundle(context) => {
                let context = context
                    .as_any()
                    .downcast_ref::<MockLoaderContext>()
                    .ok_or_else(|| PluginError::DiscoveryFailed {
                        cause: "not a mock context".to_string(),
                    })?;
                Ok(context.bundle.plugins.iter().map(factory_for).collect())
            }
        }
    }
}

/// Bus subscriber recording every event label
pub struct EventRecorder {
    labels: Mutex<Vec<String>>,
    stats: SubscriberStatistics,
    filter: EventFilter,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Arc<Self> {
        let recorder = Arc::new(Self {
            labels: Mutex::new(Vec::new()),
            stats: SubscriberStatistics::new(),
            filter: EventFilter::All,
        });
        bus.subscribe(recorder.clone());
        recorder
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber for EventRecorder {
    async fn handle_event(&self, event: &Event) -> Result<(), HandlerError> {
        self.labels.lock().unwrap().push(event_label(event));
        Ok(())
    }

    fn subscriber_id(&self) -> &str {
        "event-recorder"
    }

    fn source(&self) -> &str {
        "plugin-tests"
    }

    fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn get_statistics(&self) -> &SubscriberStatistics {
        &self.stats
    }
}

/// Manager wired to mocks, with an event recorder on its bus
pub struct Harness {
    pub manager: PluginManager,
    pub provider: Arc<MockContextProvider>,
    pub events: Arc<EventRecorder>,
    pub journal: Journal,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(journal(), MockDiscovery::default(), ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        Self::build(journal(), MockDiscovery::default(), config)
    }

    pub fn build(journal: Journal, discovery: MockDiscovery, config: ManagerConfig) -> Self {
        let bus = Arc::new(EventBus::new());
        let events = EventRecorder::attach(&bus);
        let provider = Arc::new(MockContextProvider::default());
        let manager = PluginManager::builder()
            .event_bus(bus)
            .context_provider(provider.clone())
            .discovery(Arc::new(discovery))
            .config(config)
            .build();

        Self {
            manager,
            provider,
            events,
            journal,
        }
    }

    pub fn contexts(&self) -> &ContextCounters {
        &self.provider.counters
    }

    pub fn plugin(&self, name: &str) -> MockPlugin {
        MockPlugin::new(name, &self.journal)
    }

    pub fn journal(&self) -> Vec<String> {
        entries(&self.journal)
    }

    /// Only the create/destroy entries of the journal
    pub fn hooks(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|e| e.starts_with("create:") || e.starts_with("destroy:"))
            .collect()
    }

    /// Bus subscribers other than the event recorder
    pub fn plugin_subscriptions(&self) -> usize {
        self.manager.event_bus().subscriber_count() - 1
    }
}
