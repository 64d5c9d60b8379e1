//! Plugin Registry
//!
//! Bookkeeping of registered plugins and loaded bundles. The registry holds no
//! locks of its own; the manager guards the whole state with one mutex.

use crate::plugin::loader::LoaderContext;
use crate::plugin::subscriber::PluginSubscriber;
use crate::plugin::traits::{same_instance, Plugin};
use crate::plugin::types::{BundleInfo, PluginId, PluginOrigin, PluginSummary};
use std::sync::Arc;

/// A registered plugin instance and its subscription
pub(crate) struct PluginEntry {
    pub(crate) id: PluginId,
    pub(crate) origin: PluginOrigin,
    pub(crate) subscriber: Arc<PluginSubscriber>,
}

impl PluginEntry {
    pub(crate) fn plugin(&self) -> &Arc<dyn Plugin> {
        self.subscriber.plugin()
    }

    pub(crate) fn name(&self) -> &str {
        self.subscriber.plugin_name()
    }

    pub(crate) fn summary(&self) -> PluginSummary {
        PluginSummary {
            id: self.id,
            name: self.name().to_string(),
            bundle: self.origin.bundle().map(str::to_string),
            origin: self.origin.to_string(),
        }
    }
}

/// A loaded bundle.
///
/// `plugins` is declared before `context` so an accidental drop never unloads the
/// context before the instances created from it.
pub(crate) struct Bundle {
    pub(crate) info: BundleInfo,
    pub(crate) plugins: Vec<PluginEntry>,
    pub(crate) context: Box<dyn LoaderContext>,
}

/// Registry state guarded by the manager
#[derive(Default)]
pub(crate) struct RegistryState {
    standalone: Vec<PluginEntry>,
    /// Insertion order is the shutdown order
    bundles: Vec<Bundle>,
}

impl std::fmt::Debug for RegistryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryState")
            .field("standalone", &self.standalone.iter().map(|e| e.id).collect::<Vec<_>>())
            .field("bundles", &self.bundle_names())
            .finish()
    }
}

impl RegistryState {
    fn entries(&self) -> impl Iterator<Item = &PluginEntry> {
        self.standalone
            .iter()
            .chain(self.bundles.iter().flat_map(|b| b.plugins.iter()))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.standalone.is_empty() && self.bundles.is_empty()
    }

    /// Id of the entry holding this exact instance
    pub(crate) fn find_instance(&self, plugin: &Arc<dyn Plugin>) -> Option<PluginId> {
        self.entries()
            .find(|entry| same_instance(entry.plugin(), plugin))
            .map(|entry| entry.id)
    }

    pub(crate) fn entry(&self, id: PluginId) -> Option<&PluginEntry> {
        self.entries().find(|entry| entry.id == id)
    }

    pub(crate) fn push_standalone(&mut self, entry: PluginEntry) {
        self.standalone.push(entry);
    }

    /// Remove an entry from whichever collection holds it
    pub(crate) fn take_entry(&mut self, id: PluginId) -> Option<PluginEntry> {
        if let Some(index) = self.standalone.iter().position(|e| e.id == id) {
            return Some(self.standalone.remove(index));
        }
        self.bundles.iter_mut().find_map(|bundle| {
            let index = bundle.plugins.iter().position(|e| e.id == id)?;
            Some(bundle.plugins.remove(index))
        })
    }

    pub(crate) fn take_all_standalone(&mut self) -> Vec<PluginEntry> {
        std::mem::take(&mut self.standalone)
    }

    pub(crate) fn has_bundle(&self, name: &str) -> bool {
        self.bundles.iter().any(|b| b.info.name == name)
    }

    pub(crate) fn bundle(&self, name: &str) -> Option<&Bundle> {
        self.bundles.iter().find(|b| b.info.name == name)
    }

    /// Register a bundle; the caller has checked the name is free
    pub(crate) fn insert_bundle(&mut self, bundle: Bundle) {
        debug_assert!(!self.has_bundle(&bundle.info.name));
        self.bundles.push(bundle);
    }

    pub(crate) fn take_bundle(&mut self, name: &str) -> Option<Bundle> {
        let index = self.bundles.iter().position(|b| b.info.name == name)?;
        Some(self.bundles.remove(index))
    }

    pub(crate) fn take_all_bundles(&mut self) -> Vec<Bundle> {
        std::mem::take(&mut self.bundles)
    }

    pub(crate) fn first_bundle_name(&self) -> Option<String> {
        self.bundles.first().map(|b| b.info.name.clone())
    }

    pub(crate) fn bundle_names(&self) -> Vec<String> {
        self.bundles.iter().map(|b| b.info.name.clone()).collect()
    }

    /// Ids of all registered plugins: standalone first, then bundles in load order
    pub(crate) fn plugin_ids(&self) -> Vec<PluginId> {
        self.entries().map(|entry| entry.id).collect()
    }

    pub(crate) fn plugin_count(&self) -> usize {
        self.standalone.len() + self.bundles.iter().map(|b| b.plugins.len()).sum::<usize>()
    }

    pub(crate) fn summaries(&self) -> Vec<PluginSummary> {
        self.entries().map(PluginEntry::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::error::PluginResult;

    struct Named(&'static str);

    #[async_trait::async_trait]
    impl Plugin for Named {
        fn plugin_name(&self) -> &str {
            self.0
        }
    }

    struct NullContext;

    impl LoaderContext for NullContext {
        fn location(&self) -> &str {
            "null"
        }
        fn resource(&self, _name: &str) -> PluginResult<Option<Vec<u8>>> {
            Ok(None)
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn release(self: Box<Self>) {}
    }

    fn entry(id: u64, plugin: Arc<dyn Plugin>, origin: PluginOrigin) -> PluginEntry {
        let id = PluginId::new(id);
        PluginEntry {
            id,
            origin,
            subscriber: Arc::new(PluginSubscriber::new(id, plugin)),
        }
    }

    #[test]
    fn test_identity_lookup_spans_collections() {
        let host: Arc<dyn Plugin> = Arc::new(Named("host"));
        let owned: Arc<dyn Plugin> = Arc::new(Named("owned"));
        let stranger: Arc<dyn Plugin> = Arc::new(Named("host"));

        let mut state = RegistryState::default();
        state.push_standalone(entry(1, host.clone(), PluginOrigin::Host));
        state.insert_bundle(Bundle {
            info: BundleInfo::named("A"),
            plugins: vec![entry(2, owned.clone(), PluginOrigin::Bundle("A".into()))],
            context: Box::new(NullContext),
        });

        assert_eq!(state.find_instance(&host), Some(PluginId::new(1)));
        assert_eq!(state.find_instance(&owned), Some(PluginId::new(2)));
        // Same name, different instance
        assert_eq!(state.find_instance(&stranger), None);
        assert_eq!(state.plugin_ids(), vec![PluginId::new(1), PluginId::new(2)]);
        assert_eq!(state.plugin_count(), 2);
    }

    #[test]
    fn test_take_entry_from_bundle() {
        let mut state = RegistryState::default();
        state.insert_bundle(Bundle {
            info: BundleInfo::named("A"),
            plugins: vec![
                entry(1, Arc::new(Named("a1")), PluginOrigin::Bundle("A".into())),
                entry(2, Arc::new(Named("a2")), PluginOrigin::Bundle("A".into())),
            ],
            context: Box::new(NullContext),
        });

        let taken = state.take_entry(PluginId::new(2)).unwrap();
        assert_eq!(taken.name(), "a2");
        assert_eq!(state.plugin_count(), 1);
        assert!(state.take_entry(PluginId::new(2)).is_none());
        assert!(state.has_bundle("A"));
    }

    #[test]
    fn test_bundles_keep_insertion_order() {
        let mut state = RegistryState::default();
        for name in ["b", "a", "c"] {
            state.insert_bundle(Bundle {
                info: BundleInfo::named(name),
                plugins: Vec::new(),
                context: Box::new(NullContext),
            });
        }

        assert_eq!(state.bundle_names(), vec!["b", "a", "c"]);
        assert_eq!(state.first_bundle_name().as_deref(), Some("b"));

        let taken = state.take_bundle("a").unwrap();
        assert_eq!(taken.info.name, "a");
        assert_eq!(state.bundle_names(), vec!["b", "c"]);
        assert!(state.take_bundle("a").is_none());
    }

    #[test]
    fn test_summary_reports_origin() {
        let e = entry(5, Arc::new(Named("x")), PluginOrigin::Bundle("B".into()));
        let summary = e.summary();
        assert_eq!(summary.name, "x");
        assert_eq!(summary.bundle.as_deref(), Some("B"));
        assert_eq!(summary.origin, "bundle:B");
    }
}
