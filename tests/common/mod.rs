//! Shared fixtures for integration tests: in-memory bundles and recording plugins

#![allow(dead_code)]

use async_trait::async_trait;
use bundlehost::notifications::api::{Event, EventFilter};
use bundlehost::plugin::api::{
    ContextProvider, DefaultDiscovery, DiscoveryScope, DiscoveryService, LoaderContext, Plugin,
    PluginConstructorFn, PluginContext, PluginError, PluginFactory, PluginResult,
    DESCRIPTOR_RESOURCE,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records the host topics it receives
pub struct TopicRecorder {
    name: String,
    topics: Arc<Mutex<Vec<String>>>,
}

impl TopicRecorder {
    pub fn new(name: &str) -> (Arc<Self>, Arc<Mutex<Vec<String>>>) {
        let topics = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::new(Self {
            name: name.to_string(),
            topics: topics.clone(),
        });
        (recorder, topics)
    }
}

#[async_trait]
impl Plugin for TopicRecorder {
    fn plugin_name(&self) -> &str {
        &self.name
    }

    async fn handle_event(&self, event: &Event) -> PluginResult<()> {
        if let Event::Host(host) = event {
            self.topics.lock().unwrap().push(host.topic.clone());
        }
        Ok(())
    }
}

/// Answers every `ping` with a `pong` through the context it was created with
#[derive(Default)]
pub struct PingResponder {
    context: Mutex<Option<PluginContext>>,
}

#[async_trait]
impl Plugin for PingResponder {
    fn plugin_name(&self) -> &str {
        "ping-responder"
    }

    fn event_filter(&self) -> EventFilter {
        EventFilter::Topic("ping".to_string())
    }

    async fn on_create(&self, context: &PluginContext) -> PluginResult<()> {
        *self.context.lock().unwrap() = Some(context.clone());
        Ok(())
    }

    async fn handle_event(&self, _event: &Event) -> PluginResult<()> {
        let context = self.context.lock().unwrap().clone();
        match context {
            Some(context) if context.emit("pong", serde_json::Value::Null) => Ok(()),
            _ => Err(PluginError::execution("ping-responder", "handle_event", "cannot emit")),
        }
    }
}

#[derive(Default)]
pub struct Greeter;

#[async_trait]
impl Plugin for Greeter {
    fn plugin_name(&self) -> &str {
        "greeter"
    }
}

#[derive(Default)]
pub struct Farewell;

#[async_trait]
impl Plugin for Farewell {
    fn plugin_name(&self) -> &str {
        "farewell"
    }
}

/// Contents of an in-memory bundle
#[derive(Clone)]
pub struct MemoryBundle {
    pub descriptor: Option<String>,
    pub plugins: Vec<(&'static str, PluginConstructorFn)>,
}

pub struct MemoryContext {
    location: String,
    bundle: MemoryBundle,
    released: Arc<AtomicUsize>,
}

impl LoaderContext for MemoryContext {
    fn location(&self) -> &str {
        &self.location
    }

    fn resource(&self, name: &str) -> PluginResult<Option<Vec<u8>>> {
        Ok((name == DESCRIPTOR_RESOURCE)
            .then(|| self.bundle.descriptor.clone())
            .flatten()
            .map(String::into_bytes))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn release(self: Box<Self>) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves [`MemoryBundle`]s by location
#[derive(Default)]
pub struct MemoryProvider {
    bundles: Mutex<HashMap<String, MemoryBundle>>,
    pub released: Arc<AtomicUsize>,
}

impl MemoryProvider {
    pub fn insert(&self, location: &str, bundle: MemoryBundle) {
        self.bundles
            .lock()
            .unwrap()
            .insert(location.to_string(), bundle);
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ContextProvider for MemoryProvider {
    fn open(&self, location: &str) -> PluginResult<Box<dyn LoaderContext>> {
        let bundle = self
            .bundles
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| PluginError::ContextOpenFailed {
                location: location.to_string(),
                cause: "not in memory".to_string(),
            })?;
        Ok(Box::new(MemoryContext {
            location: location.to_string(),
            bundle,
            released: self.released.clone(),
        }))
    }
}

/// Memory bundles for the bundle scope, builtin registrations for the process scope
pub struct MemoryDiscovery;

impl DiscoveryService for MemoryDiscovery {
    fn find_implementations(&self, scope: DiscoveryScope<'_>) -> PluginResult<Vec<PluginFactory>> {
        match scope {
            DiscoveryScope::Process => DefaultDiscovery.find_implementations(scope),
            DiscoveryScope::Bundle(context) => {
                let context = context
                    .as_any()
                    .downcast_ref::<MemoryContext>()
                    .ok_or_else(|| PluginError::DiscoveryFailed {
                        cause: "not a memory bundle".to_string(),
                    })?;
                Ok(context
                    .bundle
                    .plugins
                    .iter()
                    .map(|(name, constructor)| PluginFactory::new(*name, *constructor))
                    .collect())
            }
        }
    }
}

/// Poll `condition` for up to a second
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Default constructor of `P` as a bundle export
pub fn constructor<P: Plugin + Default + 'static>() -> PluginConstructorFn {
    || Arc::new(P::default())
}

/// Bundle descriptor plus exported plugins
pub fn memory_bundle(
    descriptor: serde_json::Value,
    plugins: Vec<(&'static str, PluginConstructorFn)>,
) -> MemoryBundle {
    MemoryBundle {
        descriptor: Some(descriptor.to_string()),
        plugins,
    }
}
