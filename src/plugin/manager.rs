//! Plugin Manager
//!
//! Owns the registry of standalone plugins and loaded bundles and drives every
//! lifecycle transition: create, subscribe, retire, destroy, unsubscribe and the
//! release of bundle loader contexts.
//!
//! All structural operations serialise on one async mutex around the registry.
//! Lifecycle events are published after that mutex is released.

use crate::notifications::api::{
    DeliveryReport, Event, EventBus, NotificationError, SystemEvent, SystemEventType,
};
use crate::notifications::bus::panic_message;
use crate::plugin::context::PluginContext;
use crate::plugin::descriptor::read_descriptor;
use crate::plugin::discovery::{DefaultDiscovery, DiscoveryScope, DiscoveryService};
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::events;
use crate::plugin::external::native::NativeContextProvider;
use crate::plugin::loader::{ContextProvider, LoaderContext};
use crate::plugin::registry::{Bundle, PluginEntry, RegistryState};
use crate::plugin::scan::find_bundle_files;
use crate::plugin::settings::ManagerConfig;
use crate::plugin::subscriber::PluginSubscriber;
use crate::plugin::traits::{same_instance, Plugin};
use crate::plugin::types::{BundleInfo, PluginId, PluginOrigin, PluginSummary};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Poll interval while waiting for in-flight deliveries to finish
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Central plugin manager
pub struct PluginManager {
    state: Mutex<RegistryState>,
    bus: Arc<EventBus>,
    provider: Arc<dyn ContextProvider>,
    discovery: Arc<dyn DiscoveryService>,
    config: ManagerConfig,
    next_id: AtomicU64,
    shutdown_announced: AtomicBool,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("bus", &self.bus)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`PluginManager`]; unset collaborators get the native defaults
#[derive(Default)]
pub struct PluginManagerBuilder {
    bus: Option<Arc<EventBus>>,
    provider: Option<Arc<dyn ContextProvider>>,
    discovery: Option<Arc<dyn DiscoveryService>>,
    config: ManagerConfig,
}

impl PluginManagerBuilder {
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn discovery(mut self, discovery: Arc<dyn DiscoveryService>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> PluginManager {
        PluginManager {
            state: Mutex::new(RegistryState::default()),
            bus: self.bus.unwrap_or_else(|| Arc::new(EventBus::new())),
            provider: self
                .provider
                .unwrap_or_else(|| Arc::new(NativeContextProvider)),
            discovery: self.discovery.unwrap_or_else(|| Arc::new(DefaultDiscovery)),
            config: self.config,
            next_id: AtomicU64::new(1),
            shutdown_announced: AtomicBool::new(false),
        }
    }
}

impl PluginManager {
    /// Manager with native bundles, default discovery and a fresh event bus
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> PluginManagerBuilder {
        PluginManagerBuilder::default()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ---- bundles ----------------------------------------------------------

    /// Load the bundle at `location` and register every plugin it exports.
    ///
    /// On any failure nothing stays registered or subscribed and the loader
    /// context opened for this attempt is released.
    pub async fn load_bundle(&self, location: &str) -> PluginResult<BundleInfo> {
        log::debug!("Loading bundle from {}", location);
        let context = self.provider.open(location)?;

        let instances = match self.instantiate_bundle_plugins(context.as_ref()) {
            Ok(instances) => instances,
            Err(e) => {
                self.release_context(context, Vec::new()).await;
                return Err(e);
            }
        };

        let info = match read_descriptor(context.as_ref()) {
            Ok(info) => info,
            Err(e) => {
                drop(instances);
                self.release_context(context, Vec::new()).await;
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        if state.has_bundle(&info.name) {
            drop(state);
            drop(instances);
            self.release_context(context, Vec::new()).await;
            return Err(PluginError::DuplicateBundle { name: info.name });
        }

        let origin = PluginOrigin::Bundle(info.name.clone());
        let mut added: Vec<PluginEntry> = Vec::with_capacity(instances.len());
        let mut failure = None;
        for plugin in instances {
            if state.find_instance(&plugin).is_some()
                || added.iter().any(|e| same_instance(e.plugin(), &plugin))
            {
                log::debug!(
                    "Plugin '{}' from {} is already registered",
                    plugin.plugin_name(),
                    info.name
                );
                continue;
            }
            match self.create_and_subscribe(plugin, origin.clone()).await {
                Ok(entry) => added.push(entry),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(error) = failure {
            // Undo the instances of this bundle that completed create
            for entry in added.iter().rev() {
                self.teardown(entry).await;
            }
            drop(state);
            log::warn!("Bundle '{}' failed to load: {}", info.name, error);
            self.release_context(context, added).await;
            return Err(error);
        }

        let notifications: Vec<Event> = added.iter().map(events::plugin_added).collect();
        let plugin_count = added.len();
        state.insert_bundle(Bundle {
            info: info.clone(),
            plugins: added,
            context,
        });
        drop(state);

        log::info!(
            "Loaded bundle '{}' with {} plugin(s) from {}",
            info.name,
            plugin_count,
            location
        );
        self.notify(notifications).await;
        self.notify(vec![events::bundle_loaded(&info.name, plugin_count)])
            .await;
        Ok(info)
    }

    /// Unload a bundle by name. Returns false if no such bundle is loaded.
    pub async fn unload_bundle(&self, name: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(bundle) = state.take_bundle(name) else {
            log::debug!("No bundle named '{}' to unload", name);
            return false;
        };

        let Bundle {
            info,
            plugins,
            context,
        } = bundle;
        for entry in &plugins {
            self.teardown(entry).await;
        }
        drop(state);

        let notifications: Vec<Event> = plugins.iter().map(events::plugin_removed).collect();
        let plugin_count = plugins.len();
        self.release_context(context, plugins).await;

        log::info!("Unloaded bundle '{}'", info.name);
        self.notify(notifications).await;
        self.notify(vec![events::bundle_unloaded(&info.name, plugin_count)])
            .await;
        true
    }

    /// Load every bundle found below `root`. Failures are logged and skipped.
    pub async fn load_bundles_from_dir(&self, root: &Path) -> Vec<BundleInfo> {
        let candidates = find_bundle_files(root, &self.config.scan_options());
        let mut loaded = Vec::with_capacity(candidates.len());

        for path in candidates {
            let location = path.display().to_string();
            match self.load_bundle(&location).await {
                Ok(info) => loaded.push(info),
                Err(e) => log::warn!("Skipping bundle {}: {}", location, e),
            }
        }
        loaded
    }

    // ---- standalone plugins ----------------------------------------------

    /// Register a host-owned plugin instance.
    ///
    /// If this exact instance is already registered, its existing id is returned
    /// and nothing else happens.
    pub async fn add_plugin(&self, plugin: Arc<dyn Plugin>) -> PluginResult<PluginId> {
        self.add_standalone(plugin, PluginOrigin::Host).await
    }

    /// Remove a registered instance. Returns false if it is not registered.
    pub async fn remove_plugin(&self, plugin: &Arc<dyn Plugin>) -> bool {
        let id = {
            let state = self.state.lock().await;
            state.find_instance(plugin)
        };
        match id {
            Some(id) => self.remove_plugin_by_id(id).await,
            None => false,
        }
    }

    /// Remove a registered plugin by id. Returns false if the id is unknown.
    pub async fn remove_plugin_by_id(&self, id: PluginId) -> bool {
        let mut state = self.state.lock().await;
        let Some(entry) = state.entry(id) else {
            return false;
        };
        self.teardown(entry).await;
        let Some(entry) = state.take_entry(id) else {
            return false;
        };
        drop(state);

        log::debug!("Removed plugin '{}' ({})", entry.name(), entry.id);
        self.notify(vec![events::plugin_removed(&entry)]).await;
        true
    }

    /// Instantiate and register every process-wide implementation.
    ///
    /// A candidate that fails to construct or create is logged and skipped.
    pub async fn discover_process_wide(&self) -> Vec<PluginId> {
        let factories = match self.discovery.find_implementations(DiscoveryScope::Process) {
            Ok(factories) => factories,
            Err(e) => {
                log::warn!("Process-wide discovery failed: {}", e);
                return Vec::new();
            }
        };

        let mut ids = Vec::with_capacity(factories.len());
        for factory in factories {
            if self.config.is_excluded(factory.type_name()) {
                log::debug!("Skipping excluded plugin {}", factory.type_name());
                continue;
            }
            let plugin = match factory.instantiate() {
                Ok(plugin) => plugin,
                Err(e) => {
                    log::warn!("Could not construct {}: {}", factory.type_name(), e);
                    continue;
                }
            };
            if self.config.is_excluded(plugin.plugin_name()) {
                log::debug!("Skipping excluded plugin '{}'", plugin.plugin_name());
                continue;
            }
            match self.add_standalone(plugin, PluginOrigin::Discovered).await {
                Ok(id) => ids.push(id),
                Err(e) => log::warn!("Discovered plugin {} failed: {}", factory.short_name(), e),
            }
        }
        ids
    }

    // ---- shutdown ---------------------------------------------------------

    /// Tear everything down: bundles in load order, then standalone plugins.
    ///
    /// Never fails and may be called any number of times.
    pub async fn close(&self) {
        if !self.shutdown_announced.swap(true, Ordering::SeqCst) {
            self.notify(vec![Event::System(SystemEvent::new(SystemEventType::Shutdown))])
                .await;
        }

        loop {
            let next = self.state.lock().await.first_bundle_name();
            match next {
                Some(name) => {
                    self.unload_bundle(&name).await;
                }
                None => break,
            }
        }

        let mut state = self.state.lock().await;
        let standalone = state.take_all_standalone();
        for entry in &standalone {
            self.teardown(entry).await;
        }
        drop(state);

        if !standalone.is_empty() {
            log::debug!("Removed {} standalone plugin(s)", standalone.len());
        }
        let notifications = standalone.iter().map(events::plugin_removed).collect();
        drop(standalone);
        self.notify(notifications).await;
    }

    // ---- events -----------------------------------------------------------

    /// Publish an event and wait until every subscriber handled it
    pub async fn publish(&self, event: Event) -> DeliveryReport {
        self.bus.publish(event).await
    }

    /// Publish an event on a background task
    pub fn publish_async(
        &self,
        event: Event,
    ) -> Result<JoinHandle<DeliveryReport>, NotificationError> {
        self.bus.publish_async(event)
    }

    // ---- queries ----------------------------------------------------------

    pub async fn plugin_ids(&self) -> Vec<PluginId> {
        self.state.lock().await.plugin_ids()
    }

    pub async fn plugin_count(&self) -> usize {
        self.state.lock().await.plugin_count()
    }

    /// Loaded bundle names in load order
    pub async fn bundle_names(&self) -> Vec<String> {
        self.state.lock().await.bundle_names()
    }

    pub async fn bundle_info(&self, name: &str) -> Option<BundleInfo> {
        self.state
            .lock()
            .await
            .bundle(name)
            .map(|bundle| bundle.info.clone())
    }

    pub async fn contains_plugin(&self, plugin: &Arc<dyn Plugin>) -> bool {
        self.state.lock().await.find_instance(plugin).is_some()
    }

    /// One summary per registered plugin
    pub async fn plugin_summaries(&self) -> Vec<PluginSummary> {
        self.state.lock().await.summaries()
    }

    /// Summaries of every registered plugin called `name`, in registration order
    pub async fn find_plugins(&self, name: &str) -> PluginResult<Vec<PluginSummary>> {
        let matches: Vec<PluginSummary> = self
            .plugin_summaries()
            .await
            .into_iter()
            .filter(|summary| summary.name == name)
            .collect();
        if matches.is_empty() {
            return Err(PluginError::PluginNotFound {
                plugin_name: name.to_string(),
            });
        }
        Ok(matches)
    }

    // ---- internals --------------------------------------------------------

    fn allocate_id(&self) -> PluginId {
        PluginId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn instantiate_bundle_plugins(
        &self,
        context: &dyn LoaderContext,
    ) -> PluginResult<Vec<Arc<dyn Plugin>>> {
        let factories = self
            .discovery
            .find_implementations(DiscoveryScope::Bundle(context))
            .map_err(|e| match e {
                PluginError::DiscoveryFailed { .. } => e,
                other => PluginError::DiscoveryFailed {
                    cause: other.to_string(),
                },
            })?;

        factories.iter().map(|factory| factory.instantiate()).collect()
    }

    async fn add_standalone(
        &self,
        plugin: Arc<dyn Plugin>,
        origin: PluginOrigin,
    ) -> PluginResult<PluginId> {
        let mut state = self.state.lock().await;
        if let Some(id) = state.find_instance(&plugin) {
            log::debug!(
                "Plugin '{}' is already registered as {}",
                plugin.plugin_name(),
                id
            );
            return Ok(id);
        }

        let entry = self.create_and_subscribe(plugin, origin).await?;
        let id = entry.id;
        let notification = events::plugin_added(&entry);
        log::debug!("Added plugin '{}' ({}, {})", entry.name(), id, entry.origin);
        state.push_standalone(entry);
        drop(state);

        self.notify(vec![notification]).await;
        Ok(id)
    }

    /// Run `on_create` and subscribe the instance. On failure the instance is
    /// neither registered nor subscribed.
    async fn create_and_subscribe(
        &self,
        plugin: Arc<dyn Plugin>,
        origin: PluginOrigin,
    ) -> PluginResult<PluginEntry> {
        let id = self.allocate_id();
        let name = plugin.plugin_name().to_string();
        let context = PluginContext::new(
            id,
            origin.bundle().map(str::to_string),
            self.bus.publisher(),
        );

        match AssertUnwindSafe(plugin.on_create(&context)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PluginError::init_failed(name, e)),
            Err(panic) => {
                return Err(PluginError::init_failed(
                    name,
                    format!("on_create panicked: {}", panic_message(panic.as_ref())),
                ))
            }
        }

        let entry = PluginEntry {
            id,
            origin,
            subscriber: Arc::new(PluginSubscriber::new(id, plugin)),
        };
        if !self.bus.subscribe(entry.subscriber.clone()) {
            entry.subscriber.retire();
            self.destroy(&entry).await;
            return Err(PluginError::init_failed(
                name,
                format!("subscriber id {id} is already in use"),
            ));
        }
        Ok(entry)
    }

    /// Retire, destroy and unsubscribe one entry. Destroy failures are logged.
    async fn teardown(&self, entry: &PluginEntry) {
        entry.subscriber.retire();
        self.destroy(entry).await;
        self.bus.unsubscribe(&entry.id.to_string());
    }

    async fn destroy(&self, entry: &PluginEntry) {
        match AssertUnwindSafe(entry.plugin().on_destroy())
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Plugin '{}' failed to shut down: {}", entry.name(), e),
            Err(panic) => log::error!(
                "Plugin '{}' panicked while shutting down: {}",
                entry.name(),
                panic_message(panic.as_ref())
            ),
        }
    }

    /// Release a loader context once nothing references the plugins created from it.
    ///
    /// In-flight deliveries hold the subscriber until they finish. If they do not
    /// finish within the configured grace period the context is leaked instead.
    async fn release_context(&self, context: Box<dyn LoaderContext>, entries: Vec<PluginEntry>) {
        let deadline = Instant::now() + self.config.release_grace();
        while entries.iter().any(is_referenced) {
            if Instant::now() >= deadline {
                log::error!(
                    "Plugins from {} are still in use after {:?}; leaving the bundle loaded",
                    context.location(),
                    self.config.release_grace()
                );
                drop(entries);
                context.leak();
                return;
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }

        drop(entries);
        log::debug!("Releasing loader context {}", context.location());
        context.release();
    }

    async fn notify(&self, notifications: Vec<Event>) {
        for event in notifications {
            self.bus.publish(event).await;
        }
    }
}

fn is_referenced(entry: &PluginEntry) -> bool {
    Arc::strong_count(&entry.subscriber) > 1 || Arc::strong_count(entry.plugin()) > 1
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.is_empty() {
            return;
        }

        log::warn!("Plugin manager dropped without close(); leaving bundles loaded");
        for entry in state.take_all_standalone() {
            entry.subscriber.retire();
            self.bus.unsubscribe(&entry.id.to_string());
        }
        for bundle in state.take_all_bundles() {
            let Bundle {
                plugins, context, ..
            } = bundle;
            for entry in &plugins {
                entry.subscriber.retire();
                self.bus.unsubscribe(&entry.id.to_string());
            }
            drop(plugins);
            context.leak();
        }
    }
}
