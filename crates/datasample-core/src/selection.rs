//! The working set of keys slated for copying.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

use crate::entity::EntityType;
use crate::value::Key;

/// Mapping from entity type to the set of keys selected for it.
///
/// A `Selection` is created by the sampling collaborator, then moved through
/// the import pipeline: expansion adds keys, deduplication removes them, and
/// replication reads what is left. Iteration is in entity-type label order and
/// key order, so batching is deterministic.
///
/// # Example
///
/// ```
/// use datasample_core::selection::Selection;
/// use datasample_core::value::Key;
///
/// let mut selection = Selection::new();
/// selection.insert("shop.Order", 1_i64);
/// selection.insert("shop.Order", 1_i64);
/// selection.insert("shop.Order", 2_i64);
///
/// assert_eq!(selection.len_of(&"shop.Order".into()), 2);
/// assert!(selection.contains(&"shop.Order".into(), &Key::Int(2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entries: BTreeMap<EntityType, BTreeSet<Key>>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, returning whether it was new.
    pub fn insert(&mut self, entity: impl Into<EntityType>, key: impl Into<Key>) -> bool {
        self.entries
            .entry(entity.into())
            .or_default()
            .insert(key.into())
    }

    /// Add many keys to one entity type.
    pub fn extend<K, I>(&mut self, entity: impl Into<EntityType>, keys: I)
    where
        K: Into<Key>,
        I: IntoIterator<Item = K>,
    {
        self.entries
            .entry(entity.into())
            .or_default()
            .extend(keys.into_iter().map(Into::into));
    }

    /// Make sure `entity` has an entry, even if empty.
    pub fn touch(&mut self, entity: impl Into<EntityType>) {
        self.entries.entry(entity.into()).or_default();
    }

    /// Keys selected for `entity`.
    pub fn keys(&self, entity: &EntityType) -> Option<&BTreeSet<Key>> {
        self.entries.get(entity)
    }

    /// Mutable keys selected for `entity`.
    pub fn keys_mut(&mut self, entity: &EntityType) -> Option<&mut BTreeSet<Key>> {
        self.entries.get_mut(entity)
    }

    /// Whether `key` is selected for `entity`.
    pub fn contains(&self, entity: &EntityType, key: &Key) -> bool {
        self.entries.get(entity).is_some_and(|keys| keys.contains(key))
    }

    /// Number of keys selected for `entity`.
    pub fn len_of(&self, entity: &EntityType) -> usize {
        self.entries.get(entity).map_or(0, BTreeSet::len)
    }

    /// Entity types with an entry (possibly empty).
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entries.keys()
    }

    /// Iterate over entity types and their keys.
    pub fn iter(&self) -> btree_map::Iter<'_, EntityType, BTreeSet<Key>> {
        self.entries.iter()
    }

    /// Iterate mutably over entity types and their keys.
    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, EntityType, BTreeSet<Key>> {
        self.entries.iter_mut()
    }

    /// Total number of keys across all entity types.
    pub fn total_keys(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// Whether no key is selected at all.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeSet::is_empty)
    }

    /// Whether every key of `self` is also in `other`.
    pub fn is_subset(&self, other: &Selection) -> bool {
        self.entries.iter().all(|(entity, keys)| {
            keys.is_empty()
                || other
                    .entries
                    .get(entity)
                    .is_some_and(|theirs| keys.is_subset(theirs))
        })
    }
}

impl From<BTreeMap<EntityType, BTreeSet<Key>>> for Selection {
    fn from(entries: BTreeMap<EntityType, BTreeSet<Key>>) -> Self {
        Self { entries }
    }
}

impl<E: Into<EntityType>, K: Into<Key>> FromIterator<(E, K)> for Selection {
    fn from_iter<I: IntoIterator<Item = (E, K)>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for (entity, key) in iter {
            selection.insert(entity, key);
        }
        selection
    }
}

impl IntoIterator for Selection {
    type Item = (EntityType, BTreeSet<Key>);
    type IntoIter = btree_map::IntoIter<EntityType, BTreeSet<Key>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = (&'a EntityType, &'a BTreeSet<Key>);
    type IntoIter = btree_map::Iter<'a, EntityType, BTreeSet<Key>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
