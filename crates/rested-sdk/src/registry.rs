use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use rested_dispatch::Dispatcher;
use rested_gate::{RightsConfig, RightsPolicy};
use rested_store::{NoPersistence, PersistenceHook, ResourceCollection};
use rested_types::Resource;
use tracing::debug;

use crate::config::{CollectionConfig, RestedConfig};
use crate::error::{SdkError, SdkResult};

/// How to build a collection when mounting it.
pub struct CollectionOptions<R, C> {
    pub rights: RightsConfig<R, C>,
    pub indexes: Vec<String>,
    pub persistence: Arc<dyn PersistenceHook>,
}

impl<R, C> CollectionOptions<R, C> {
    /// No rights, no indexes, no persistence.
    pub fn new() -> Self {
        Self {
            rights: RightsConfig::deny_all(),
            indexes: Vec::new(),
            persistence: Arc::new(NoPersistence),
        }
    }

    pub fn from_config(config: &CollectionConfig) -> Self {
        Self {
            rights: config.rights.clone().into(),
            indexes: config.indexes.clone(),
            persistence: Arc::new(NoPersistence),
        }
    }

    pub fn with_rights(mut self, rights: impl Into<RightsConfig<R, C>>) -> Self {
        self.rights = rights.into();
        self
    }

    pub fn with_index(mut self, property: impl Into<String>) -> Self {
        self.indexes.push(property.into());
        self
    }

    pub fn with_persistence(mut self, hook: impl PersistenceHook + 'static) -> Self {
        self.persistence = Arc::new(hook);
        self
    }
}

impl<R, C> Default for CollectionOptions<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A freshly mounted collection.
pub struct Mount<R: Resource, C> {
    pub name: String,
    /// `false` when the rights deny every verb: the collection exists but a
    /// transport should not expose it.
    pub routed: bool,
    pub dispatcher: Arc<Dispatcher<R, C>>,
}

impl<R: Resource, C> Mount<R, C> {
    pub fn collection(&self) -> &Arc<ResourceCollection<R>> {
        self.dispatcher.collection()
    }
}

struct Entry {
    routed: bool,
    collection: Arc<dyn Any + Send + Sync>,
    dispatcher: Arc<dyn Any + Send + Sync>,
}

/// Named collections, looked up case-insensitively.
///
/// Each entry is typed by its resource and caller-context types; lookups
/// with other types find nothing.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, register it under `name` and return its dispatcher.
    pub fn mount<R, C>(&self, name: &str, options: CollectionOptions<R, C>) -> SdkResult<Mount<R, C>>
    where
        R: Resource,
        C: 'static,
    {
        let key = name.to_lowercase();
        if self.contains(&key) {
            return Err(SdkError::AlreadyMounted(key));
        }

        let collection = ResourceCollection::new().with_shared_persistence(options.persistence);
        for property in &options.indexes {
            collection.add_index(property)?;
        }
        let collection = Arc::new(collection);

        let routed = !options.rights.denies_everything();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&collection),
            RightsPolicy::new(options.rights),
        ));

        {
            let mut entries = self.entries.write().expect("lock poisoned");
            if entries.contains_key(&key) {
                return Err(SdkError::AlreadyMounted(key));
            }
            entries.insert(
                key.clone(),
                Entry {
                    routed,
                    collection: collection as Arc<dyn Any + Send + Sync>,
                    dispatcher: Arc::clone(&dispatcher) as Arc<dyn Any + Send + Sync>,
                },
            );
        }
        debug!(collection = %key, routed, indexes = ?options.indexes, "collection mounted");

        Ok(Mount {
            name: key,
            routed,
            dispatcher,
        })
    }

    /// Mount `name` with the settings `config` has for it, or the defaults.
    pub fn mount_configured<R, C>(
        &self,
        name: &str,
        config: &RestedConfig,
    ) -> SdkResult<Mount<R, C>>
    where
        R: Resource,
        C: 'static,
    {
        let options = config
            .collection(name)
            .map(CollectionOptions::from_config)
            .unwrap_or_default();
        self.mount(name, options)
    }

    pub fn get<R, C>(&self, name: &str) -> Option<Arc<Dispatcher<R, C>>>
    where
        R: Resource,
        C: 'static,
    {
        let entries = self.entries.read().expect("lock poisoned");
        let entry = entries.get(&name.to_lowercase())?;
        Arc::clone(&entry.dispatcher).downcast().ok()
    }

    pub fn collection<R: Resource>(&self, name: &str) -> Option<Arc<ResourceCollection<R>>> {
        let entries = self.entries.read().expect("lock poisoned");
        let entry = entries.get(&name.to_lowercase())?;
        Arc::clone(&entry.collection).downcast().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .expect("lock poisoned")
            .contains_key(&name.to_lowercase())
    }

    /// Whether `name` is mounted and should be exposed by a transport.
    pub fn is_routed(&self, name: &str) -> bool {
        self.entries
            .read()
            .expect("lock poisoned")
            .get(&name.to_lowercase())
            .is_some_and(|entry| entry.routed)
    }

    /// Mounted names, in order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Unregister `name`. Dispatchers already handed out keep working.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self
            .entries
            .write()
            .expect("lock poisoned")
            .remove(&name.to_lowercase())
            .is_some();
        if removed {
            debug!(collection = %name, "collection removed");
        }
        removed
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("collections", &self.names())
            .finish()
    }
}
