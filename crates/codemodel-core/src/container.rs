//! Ordered, optionally name-indexed collections of sibling nodes.
//!
//! A container only does the bookkeeping: ordering, the key index, the
//! populated/unpopulated state and the frozen flag. Pulling declarations from a
//! source and describing failures happens in [`crate::Model`], which knows what the
//! container belongs to.

use std::hash::{BuildHasherDefault, Hash};

use rustc_hash::FxHasher;

use crate::source::Origin;

pub(crate) type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Where a container's contents come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population<'db> {
    /// Nothing has been pulled yet; the source will be asked on first access.
    Unpopulated(Origin<'db>),
    Populated,
}

/// Why a container refused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refusal {
    Frozen,
    Duplicate,
    Missing,
}

#[derive(Debug, Clone)]
pub struct Container<'db, K, T> {
    entries: FxIndexMap<K, T>,
    population: Population<'db>,
    frozen: bool,
}

impl<'db, K, T> Container<'db, K, T>
where
    K: Eq + Hash,
    T: Clone + PartialEq,
{
    pub(crate) fn new(population: Population<'db>) -> Self {
        Self { entries: FxIndexMap::default(), population, frozen: false }
    }

    pub(crate) fn populated() -> Self {
        Self::new(Population::Populated)
    }

    pub fn items(&self) -> indexmap::map::Values<'_, K, T> {
        self.entries.values()
    }

    /// The items in order, cloned out so the model can be edited while walking them.
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.values().cloned().collect()
    }

    pub fn first(&self) -> Option<&T> {
        self.entries.first().map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_populated(&self) -> bool {
        self.population == Population::Populated
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn position(&self, item: &T) -> Option<usize> {
        self.entries.values().position(|it| it == item)
    }

    pub fn key_of(&self, item: &T) -> Option<&K> {
        self.entries.iter().find_map(|(key, it)| (it == item).then_some(key))
    }

    /// Flips the container to populated and hands back the origin to pull from. Only
    /// the first call returns something.
    pub(crate) fn take_origin(&mut self) -> Option<Origin<'db>> {
        match std::mem::replace(&mut self.population, Population::Populated) {
            Population::Unpopulated(origin) => Some(origin),
            Population::Populated => None,
        }
    }

    pub(crate) fn push(&mut self, key: K, item: T) -> Result<(), Refusal> {
        if self.frozen {
            return Err(Refusal::Frozen);
        }

        if self.push_populated(key, item) { Ok(()) } else { Err(Refusal::Duplicate) }
    }

    /// Insertion path used while pulling from a source: no frozen check, and a
    /// duplicate is reported back instead of refused.
    pub(crate) fn push_populated(&mut self, key: K, item: T) -> bool {
        match self.entries.entry(key) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(item);
                true
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &K) -> Result<T, Refusal> {
        if self.frozen {
            return Err(Refusal::Frozen);
        }

        self.entries.shift_remove(key).ok_or(Refusal::Missing)
    }

    /// Moves the item under `old` to `new`, keeping its position, and returns it. The
    /// caller then updates the name stored on the item itself.
    pub(crate) fn rename(&mut self, old: &K, new: K) -> Result<T, Refusal> {
        if self.frozen {
            return Err(Refusal::Frozen);
        }

        if !self.entries.contains_key(old) {
            return Err(Refusal::Missing);
        }
        if self.entries.contains_key(&new) {
            return Err(Refusal::Duplicate);
        }

        let (position, _, item) = self.entries.shift_remove_full(old).ok_or(Refusal::Missing)?;
        self.entries.shift_insert(position, new, item.clone());
        Ok(item)
    }

    /// Swaps the item stored under `key` in place, keeping its position.
    pub(crate) fn replace(&mut self, key: &K, item: T) -> Result<T, Refusal> {
        if self.frozen {
            return Err(Refusal::Frozen);
        }

        let slot = self.entries.get_mut(key).ok_or(Refusal::Missing)?;
        Ok(std::mem::replace(slot, item))
    }

    /// Rekeys the items with keys given in item order, leaving the container
    /// untouched if two keys collide.
    pub(crate) fn reindex(&mut self, keys: Vec<K>) -> Result<(), Refusal> {
        if self.frozen {
            return Err(Refusal::Frozen);
        }

        let mut entries = FxIndexMap::default();
        for (key, item) in keys.into_iter().zip(self.entries.values()) {
            if entries.insert(key, item.clone()).is_some() {
                return Err(Refusal::Duplicate);
            }
        }

        self.entries = entries;
        Ok(())
    }

    /// Replaces the contents wholesale, keeping the first item of each key. Only for
    /// internal rewrites and rollbacks; the frozen flag is not consulted.
    pub(crate) fn rebuild(&mut self, entries: impl IntoIterator<Item = (K, T)>) {
        self.entries.clear();
        for (key, item) in entries {
            self.push_populated(key, item);
        }
    }

    /// Key and item pairs in item order.
    pub(crate) fn entries(&self) -> Vec<(K, T)>
    where
        K: Clone,
    {
        self.entries.iter().map(|(key, item)| (key.clone(), item.clone())).collect()
    }

    pub(crate) fn clear(&mut self) -> Result<Vec<T>, Refusal> {
        if self.frozen {
            return Err(Refusal::Frozen);
        }

        Ok(std::mem::take(&mut self.entries).into_values().collect())
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }
}

/// Statement lists hold plain values rather than handles, so they get their own
/// unindexed sequence with the same frozen discipline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<T> {
    items: Vec<T>,
    frozen: bool,
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self { items: Vec::new(), frozen: false }
    }
}

impl<T> Sequence<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn push(&mut self, item: T) -> Result<(), Refusal> {
        if self.frozen {
            return Err(Refusal::Frozen);
        }
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    /// An unfrozen copy with the same items.
    pub(crate) fn thaw(&self) -> Self
    where
        T: Clone,
    {
        Self { items: self.items.clone(), frozen: false }
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect(), frozen: false }
    }
}
