//! Specialized collection types

use slotmap::{Key, SlotMap};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Why a batch cannot be applied to an [`IdentityArena`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchConflict<I> {
    /// Removal of an id that is not present
    Missing(I),
    /// Addition of an id that would still be present
    Duplicate(I),
}

/// Keyed arena indexed by a stable identity
///
/// Values live in a generational [`SlotMap`]; the identity index maps each
/// external id to its slot. A key that outlived its value fails lookup
/// instead of aliasing a newer value, which makes double removal visible.
#[derive(Debug)]
pub struct IdentityArena<I, K: Key, V> {
    slots: SlotMap<K, V>,
    index: HashMap<I, K>,
}

impl<I: Eq + Hash + Clone, K: Key, V> IdentityArena<I, K, V> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            index: HashMap::new(),
        }
    }

    /// Insert a value for `id`
    ///
    /// Returns `Err(value)` without touching the arena when `id` is already present.
    pub fn insert(&mut self, id: I, value: V) -> Result<K, V> {
        if self.index.contains_key(&id) {
            return Err(value);
        }
        let key = self.slots.insert(value);
        self.index.insert(id, key);
        Ok(key)
    }

    /// Check that a remove-then-add batch applies cleanly
    ///
    /// Every removed id must be present (and removed once); every added id
    /// must be absent once the removals are applied, and added once.
    pub fn check_batch<'a>(
        &self,
        removed: impl IntoIterator<Item = &'a I>,
        added: impl IntoIterator<Item = &'a I>,
    ) -> Result<(), BatchConflict<I>>
    where
        I: 'a,
    {
        let mut gone: HashSet<&I> = HashSet::new();
        for id in removed {
            if !self.index.contains_key(id) || !gone.insert(id) {
                return Err(BatchConflict::Missing(id.clone()));
            }
        }

        let mut fresh: HashSet<&I> = HashSet::new();
        for id in added {
            let still_present = self.index.contains_key(id) && !gone.contains(id);
            if still_present || !fresh.insert(id) {
                return Err(BatchConflict::Duplicate(id.clone()));
            }
        }
        Ok(())
    }

    /// Remove and return the value for `id`
    pub fn remove(&mut self, id: &I) -> Option<V> {
        let key = self.index.remove(id)?;
        self.slots.remove(key)
    }

    /// Get the value for `id`
    pub fn get(&self, id: &I) -> Option<&V> {
        self.index.get(id).and_then(|key| self.slots.get(*key))
    }

    /// Whether `id` is present
    pub fn contains(&self, id: &I) -> bool {
        self.index.contains_key(id)
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over live ids
    pub fn ids(&self) -> impl Iterator<Item = &I> {
        self.index.keys()
    }

    /// Iterate over live values
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.values()
    }
}

impl<I: Eq + Hash + Clone, K: Key, V> Default for IdentityArena<I, K, V> {
    fn default() -> Self {
        Self::new()
    }
}
