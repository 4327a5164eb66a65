//! The [`IndexSet`]: named property indexes over a resource map.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;
use rested_types::{Resource, ResourceId};
use serde_json::Value;
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::key::IndexKey;

/// Resources sharing one property value, in insertion order.
type Bucket<R> = IndexMap<ResourceId, Arc<R>>;

/// value → bucket, for one property.
type PropertyIndex<R> = HashMap<IndexKey, Bucket<R>>;

/// All secondary indexes of a collection.
///
/// Each registered property maps values to buckets. The reverse map tracks
/// the `(property, value)` buckets each resource belongs to, so
/// [`IndexSet::remove`] touches only those buckets.
pub struct IndexSet<R> {
    indexes: BTreeMap<String, PropertyIndex<R>>,
    reverse: HashMap<ResourceId, Vec<(String, IndexKey)>>,
}

impl<R> std::fmt::Debug for IndexSet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSet")
            .field("properties", &self.indexes.keys().collect::<Vec<_>>())
            .field("indexed_resources", &self.reverse.len())
            .finish()
    }
}

impl<R> Default for IndexSet<R> {
    fn default() -> Self {
        Self {
            indexes: BTreeMap::new(),
            reverse: HashMap::new(),
        }
    }
}

impl<R: Resource> IndexSet<R> {
    /// Create an empty set with no registered indexes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered indexes.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns `true` if no index is registered.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Returns `true` if an index exists on `property`.
    pub fn contains(&self, property: &str) -> bool {
        self.indexes.contains_key(property)
    }

    /// Registered property names, sorted.
    pub fn properties(&self) -> Vec<String> {
        self.indexes.keys().cloned().collect()
    }

    // ---------------------------------------------------------------
    // Schema
    // ---------------------------------------------------------------

    /// Register a new, empty index. The caller rebuilds afterwards.
    pub fn register(&mut self, property: &str) -> IndexResult<()> {
        if self.indexes.contains_key(property) {
            return Err(IndexError::IndexExists(property.to_string()));
        }
        self.indexes.insert(property.to_string(), HashMap::new());
        Ok(())
    }

    /// Drop the index on `property`. The caller rebuilds afterwards.
    pub fn unregister(&mut self, property: &str) -> IndexResult<()> {
        if self.indexes.remove(property).is_none() {
            return Err(IndexError::NoSuchIndex(property.to_string()));
        }
        Ok(())
    }

    /// Empty every index, keeping the registrations.
    pub fn clear(&mut self) {
        for index in self.indexes.values_mut() {
            index.clear();
        }
        self.reverse.clear();
    }

    /// Clear and repopulate every index from `entries`.
    pub fn rebuild<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a ResourceId, &'a Arc<R>)>,
    {
        self.clear();
        if self.indexes.is_empty() {
            return;
        }
        let mut count = 0usize;
        for (id, resource) in entries {
            self.insert(id, resource);
            count += 1;
        }
        debug!(indexes = self.indexes.len(), resources = count, "indexes rebuilt");
    }

    // ---------------------------------------------------------------
    // Maintenance
    // ---------------------------------------------------------------

    /// Add `resource` to every index for which it carries a value.
    ///
    /// Any previous participation of `id` is dropped first.
    pub fn insert(&mut self, id: &ResourceId, resource: &Arc<R>) {
        self.remove(id);
        if self.indexes.is_empty() {
            return;
        }

        let mut memberships = Vec::new();
        for (property, index) in self.indexes.iter_mut() {
            let Some(value) = resource.field(property) else {
                continue;
            };
            let key = IndexKey::of(&value);
            index
                .entry(key.clone())
                .or_default()
                .insert(id.clone(), Arc::clone(resource));
            memberships.push((property.clone(), key));
        }

        if !memberships.is_empty() {
            self.reverse.insert(id.clone(), memberships);
        }
    }

    /// Remove `id` from every bucket it occupies. Unknown ids are ignored.
    pub fn remove(&mut self, id: &ResourceId) {
        let Some(memberships) = self.reverse.remove(id) else {
            return;
        };
        for (property, key) in memberships {
            let Some(index) = self.indexes.get_mut(&property) else {
                continue;
            };
            if let Some(bucket) = index.get_mut(&key) {
                bucket.shift_remove(id);
                if bucket.is_empty() {
                    index.remove(&key);
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// The first-inserted resource whose `property` equals `value`.
    ///
    /// Values match by [`IndexKey`]: `5.0` finds `5`, `"5"` does not.
    pub fn find_one(&self, property: &str, value: &Value) -> IndexResult<Option<Arc<R>>> {
        let index = self.index(property)?;
        Ok(index
            .get(&IndexKey::of(value))
            .and_then(|bucket| bucket.values().next().cloned()))
    }

    /// All resources whose `property` equals `value`, in insertion order.
    ///
    /// The returned vector is owned by the caller; changing it does not
    /// affect the index.
    pub fn find_all(&self, property: &str, value: &Value) -> IndexResult<Vec<Arc<R>>> {
        let index = self.index(property)?;
        Ok(index
            .get(&IndexKey::of(value))
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default())
    }

    fn index(&self, property: &str) -> IndexResult<&PropertyIndex<R>> {
        self.indexes
            .get(property)
            .ok_or_else(|| IndexError::NoSuchIndex(property.to_string()))
    }
}
