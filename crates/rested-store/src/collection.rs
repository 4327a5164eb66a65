use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use rested_index::IndexSet;
use rested_types::{Resource, ResourceId, Timestamp};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::hook::{NoPersistence, PersistenceHook};

/// The id → resource map, ordered by id.
pub type EntryMap<R> = BTreeMap<ResourceId, Arc<R>>;

/// Authoritative in-memory store for one resource type.
///
/// Entries live in a copy-on-write [`EntryMap`] snapshot. Readers take a
/// cheap `Arc` clone of the current snapshot; writers publish a new one.
/// Indexes and `last_modified` only change when a mutation commits.
pub struct ResourceCollection<R: Resource> {
    entries: RwLock<Arc<EntryMap<R>>>,
    indexes: RwLock<IndexSet<R>>,
    last_modified: RwLock<Timestamp>,
    hook: Arc<dyn PersistenceHook>,
}

impl<R: Resource> ResourceCollection<R> {
    /// Create an empty collection without persistence.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::new(BTreeMap::new())),
            indexes: RwLock::new(IndexSet::new()),
            last_modified: RwLock::new(Timestamp::now()),
            hook: Arc::new(NoPersistence),
        }
    }

    /// Replace the persistence hook.
    pub fn with_persistence(mut self, hook: impl PersistenceHook + 'static) -> Self {
        self.hook = Arc::new(hook);
        self
    }

    /// Replace the persistence hook with a shared one.
    pub fn with_shared_persistence(mut self, hook: Arc<dyn PersistenceHook>) -> Self {
        self.hook = hook;
        self
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// The current snapshot of all entries.
    pub fn entries(&self) -> Arc<EntryMap<R>> {
        Arc::clone(&self.entries.read().expect("lock poisoned"))
    }

    /// An owned copy of the current entries.
    pub fn snapshot(&self) -> EntryMap<R> {
        (*self.entries()).clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<R>> {
        self.entries.read().expect("lock poisoned").get(id).cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.read().expect("lock poisoned").contains_key(id)
    }

    /// All ids, sorted.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.entries().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All resources in id order.
    pub fn list(&self) -> Vec<Arc<R>> {
        self.entries().values().cloned().collect()
    }

    /// Resources in id order for which `predicate` holds.
    pub fn filtered_list<P>(&self, mut predicate: P) -> Vec<Arc<R>>
    where
        P: FnMut(&R) -> bool,
    {
        self.entries()
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// JSON object of id → resource.
    pub fn to_json(&self) -> StoreResult<Value> {
        let entries = self.entries();
        let mut map = serde_json::Map::with_capacity(entries.len());
        for (id, resource) in entries.iter() {
            let value = serde_json::to_value(resource.as_ref())
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            map.insert(id.to_string(), value);
        }
        Ok(Value::Object(map))
    }

    // ---------------------------------------------------------------
    // Cache validation
    // ---------------------------------------------------------------

    /// Time of the last committed mutation.
    pub fn last_modified(&self) -> Timestamp {
        *self.last_modified.read().expect("lock poisoned")
    }

    /// `true` if a mutation committed after `since`, or if `since` is unknown.
    pub fn is_modified_since(&self, since: Option<Timestamp>) -> bool {
        match since {
            None => true,
            Some(since) => self.last_modified() > since,
        }
    }

    fn touch(&self) -> Timestamp {
        let mut last = self.last_modified.write().expect("lock poisoned");
        *last = last.tick();
        *last
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Store `resource` at `id`.
    ///
    /// On persistence failure the previous value at `id` is restored (or the
    /// key removed if there was none) and the error is returned.
    pub async fn put(&self, id: ResourceId, resource: R) -> StoreResult<()> {
        let resource = Arc::new(resource);
        let previous = {
            let mut entries = self.entries.write().expect("lock poisoned");
            Arc::make_mut(&mut entries).insert(id.clone(), Arc::clone(&resource))
        };

        match self.hook.save(std::slice::from_ref(&id)).await {
            Ok(()) => {
                self.indexes
                    .write()
                    .expect("lock poisoned")
                    .insert(&id, &resource);
                let at = self.touch();
                debug!(%id, %at, "put committed");
                Ok(())
            }
            Err(e) => {
                {
                    let mut entries = self.entries.write().expect("lock poisoned");
                    let map = Arc::make_mut(&mut entries);
                    match previous {
                        Some(previous) => {
                            map.insert(id.clone(), previous);
                        }
                        None => {
                            map.remove(&id);
                        }
                    }
                }
                warn!(%id, error = %e, "put rolled back");
                Err(e.into())
            }
        }
    }

    /// Replace the whole map in one all-or-nothing step.
    pub async fn put_all<I>(&self, resources: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = (ResourceId, R)>,
    {
        let next: EntryMap<R> = resources
            .into_iter()
            .map(|(id, r)| (id, Arc::new(r)))
            .collect();
        let ids: Vec<ResourceId> = next.keys().cloned().collect();
        self.swap_all(Arc::new(next), ids, "put_all").await
    }

    /// Remove `id`. Absent ids succeed immediately without persisting.
    pub async fn delete(&self, id: &ResourceId) -> StoreResult<()> {
        let removed = {
            let mut entries = self.entries.write().expect("lock poisoned");
            if !entries.contains_key(id) {
                return Ok(());
            }
            Arc::make_mut(&mut entries).remove(id)
        };

        match self.hook.save(std::slice::from_ref(id)).await {
            Ok(()) => {
                self.indexes.write().expect("lock poisoned").remove(id);
                let at = self.touch();
                debug!(%id, %at, "delete committed");
                Ok(())
            }
            Err(e) => {
                if let Some(removed) = removed {
                    let mut entries = self.entries.write().expect("lock poisoned");
                    Arc::make_mut(&mut entries).insert(id.clone(), removed);
                }
                warn!(%id, error = %e, "delete rolled back");
                Err(e.into())
            }
        }
    }

    /// Remove every resource in one all-or-nothing step.
    pub async fn delete_all(&self) -> StoreResult<()> {
        let ids = self.ids();
        self.swap_all(Arc::new(BTreeMap::new()), ids, "delete_all")
            .await
    }

    async fn swap_all(
        &self,
        next: Arc<EntryMap<R>>,
        ids: Vec<ResourceId>,
        op: &'static str,
    ) -> StoreResult<()> {
        let previous = {
            let mut entries = self.entries.write().expect("lock poisoned");
            std::mem::replace(&mut *entries, next)
        };

        match self.hook.save(&ids).await {
            Ok(()) => {
                let current = self.entries();
                self.indexes
                    .write()
                    .expect("lock poisoned")
                    .rebuild(current.iter());
                let at = self.touch();
                debug!(op, count = current.len(), %at, "bulk mutation committed");
                Ok(())
            }
            Err(e) => {
                *self.entries.write().expect("lock poisoned") = previous;
                warn!(op, error = %e, "bulk mutation rolled back");
                Err(e.into())
            }
        }
    }

    // ---------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------

    /// Replace all entries without invoking persistence.
    ///
    /// Intended for populating a collection from its backing store at startup.
    pub fn load_map<I>(&self, resources: I)
    where
        I: IntoIterator<Item = (ResourceId, R)>,
    {
        let next: EntryMap<R> = resources
            .into_iter()
            .map(|(id, r)| (id, Arc::new(r)))
            .collect();
        let next = Arc::new(next);
        *self.entries.write().expect("lock poisoned") = Arc::clone(&next);
        self.indexes
            .write()
            .expect("lock poisoned")
            .rebuild(next.iter());
        self.touch();
    }

    /// Insert or replace one entry without invoking persistence.
    pub fn load_one(&self, id: ResourceId, resource: R) {
        let resource = Arc::new(resource);
        {
            let mut entries = self.entries.write().expect("lock poisoned");
            Arc::make_mut(&mut entries).insert(id.clone(), Arc::clone(&resource));
        }
        self.indexes
            .write()
            .expect("lock poisoned")
            .insert(&id, &resource);
        self.touch();
    }

    // ---------------------------------------------------------------
    // Indexes
    // ---------------------------------------------------------------

    /// Register an index on `property` and rebuild all indexes.
    pub fn add_index(&self, property: &str) -> StoreResult<()> {
        let entries = self.entries();
        let mut indexes = self.indexes.write().expect("lock poisoned");
        indexes.register(property)?;
        indexes.rebuild(entries.iter());
        debug!(property, "index added");
        Ok(())
    }

    /// Drop the index on `property` and rebuild the remaining ones.
    pub fn remove_index(&self, property: &str) -> StoreResult<()> {
        let entries = self.entries();
        let mut indexes = self.indexes.write().expect("lock poisoned");
        indexes.unregister(property)?;
        indexes.rebuild(entries.iter());
        debug!(property, "index removed");
        Ok(())
    }

    /// Properties that currently have an index.
    pub fn indexed_properties(&self) -> Vec<String> {
        self.indexes.read().expect("lock poisoned").properties()
    }

    /// The first-inserted resource whose `property` equals `value`.
    /// Integral floats match the integer they equal.
    pub fn find_one(&self, property: &str, value: &Value) -> StoreResult<Option<Arc<R>>> {
        Ok(self
            .indexes
            .read()
            .expect("lock poisoned")
            .find_one(property, value)?)
    }

    /// Every resource whose `property` equals `value`.
    pub fn find_all(&self, property: &str, value: &Value) -> StoreResult<Vec<Arc<R>>> {
        Ok(self
            .indexes
            .read()
            .expect("lock poisoned")
            .find_all(property, value)?)
    }
}

impl<R: Resource> Default for ResourceCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> std::fmt::Debug for ResourceCollection<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCollection")
            .field("resource_count", &self.len())
            .field("indexes", &self.indexed_properties())
            .field("last_modified", &self.last_modified())
            .finish()
    }
}
