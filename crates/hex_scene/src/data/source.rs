//! Collection source - root of a pipeline
//!
//! Holds the authoritative set of items for one upstream feed and turns
//! feed batches into [`DiffEvent`]s. Computing an event and committing it
//! are separate steps so a scene can reject a batch its pipeline refuses
//! without the source drifting ahead of the renderables.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::data::{DiffEvent, Item, ItemId, ItemRef};
use crate::hex::HexCoord;

/// Identifies one source within a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub(crate) usize);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// One delivery from the upstream feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedBatch {
    /// Ids to drop; absent ids are ignored
    #[serde(default)]
    pub removed: Vec<ItemId>,
    /// Items to add; an id already present is replaced
    #[serde(default)]
    pub added: Vec<Item>,
}

impl FeedBatch {
    /// Batch that only adds
    pub fn adding(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            removed: Vec::new(),
            added: items.into_iter().collect(),
        }
    }

    /// Batch that only removes
    pub fn removing(ids: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            removed: ids.into_iter().collect(),
            added: Vec::new(),
        }
    }
}

/// Receives every committed change of a source
pub trait DataListener {
    /// Called once per committed event, removals listed before additions
    fn on_data_changed(&mut self, event: &DiffEvent<ItemRef, ItemRef>);
}

impl<F: FnMut(&DiffEvent<ItemRef, ItemRef>)> DataListener for F {
    fn on_data_changed(&mut self, event: &DiffEvent<ItemRef, ItemRef>) {
        self(event);
    }
}

/// Authoritative item set for one feed
pub struct CollectionSource {
    id: SourceId,
    items: HashMap<ItemId, ItemRef>,
    listeners: Vec<Box<dyn DataListener>>,
}

impl CollectionSource {
    /// Create an empty source
    pub fn new(id: SourceId) -> Self {
        Self {
            id,
            items: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    /// This source's id
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Register a listener for committed changes
    pub fn add_listener(&mut self, listener: Box<dyn DataListener>) {
        self.listeners.push(listener);
    }

    /// Current item for `id`
    pub fn get(&self, id: &ItemId) -> Option<&ItemRef> {
        self.items.get(id)
    }

    /// Whether `id` is present
    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    /// Ids currently present (unordered)
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.items.keys()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the source holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compute the event a batch would produce, without applying it
    ///
    /// Removals of absent ids are dropped. Adding a present id emits the old
    /// item as removed. When one batch adds an id twice only the last value
    /// is announced.
    pub fn diff(&self, batch: FeedBatch) -> DiffEvent<ItemRef, ItemRef> {
        let mut event = DiffEvent::new();
        let mut gone: HashSet<ItemId> = HashSet::new();

        for id in batch.removed {
            match self.items.get(&id) {
                Some(item) if gone.insert(id.clone()) => event.removed.push(Rc::clone(item)),
                Some(_) => log::debug!("{}: duplicate removal of {} in one batch ignored", self.id, id),
                None => log::debug!("{}: removal of absent item {} ignored", self.id, id),
            }
        }

        // Superseded additions leave a hole so later slots keep their index
        let mut slots: Vec<Option<ItemRef>> = Vec::with_capacity(batch.added.len());
        let mut pending: HashMap<ItemId, usize> = HashMap::new();
        for item in batch.added {
            if let Some(slot) = pending.insert(item.id.clone(), slots.len()) {
                log::debug!("{}: {} added twice in one batch, keeping the last", self.id, item.id);
                slots[slot] = None;
            } else if let Some(old) = self.items.get(&item.id) {
                if gone.insert(item.id.clone()) {
                    event.removed.push(Rc::clone(old));
                }
            }
            slots.push(Some(Rc::new(item)));
        }
        event.added = slots.into_iter().flatten().collect();

        event
    }

    /// Apply an event produced by [`diff`](Self::diff) and notify listeners
    pub fn commit(&mut self, event: &DiffEvent<ItemRef, ItemRef>) {
        for item in &event.removed {
            self.items.remove(&item.id);
        }
        for item in &event.added {
            self.items.insert(item.id.clone(), Rc::clone(item));
        }
        if !event.is_empty() {
            for listener in &mut self.listeners {
                listener.on_data_changed(event);
            }
        }
    }

    /// Diff and commit in one step
    pub fn apply(&mut self, batch: FeedBatch) -> DiffEvent<ItemRef, ItemRef> {
        let event = self.diff(batch);
        self.commit(&event);
        event
    }

    /// Add an item, replacing any item with the same id
    pub fn insert(&mut self, item: Item) -> DiffEvent<ItemRef, ItemRef> {
        self.apply(FeedBatch::adding([item]))
    }

    /// Replace an item; identical to [`insert`](Self::insert)
    pub fn replace(&mut self, item: Item) -> DiffEvent<ItemRef, ItemRef> {
        self.insert(item)
    }

    /// Remove an item; a no-op when absent
    pub fn remove(&mut self, id: &ItemId) -> DiffEvent<ItemRef, ItemRef> {
        self.apply(FeedBatch::removing([id.clone()]))
    }

    /// Batch that moves `id` to `coord` (remove + add of the same identity)
    ///
    /// Returns `None` when the item is absent.
    pub fn move_batch(&self, id: &ItemId, coord: HexCoord) -> Option<FeedBatch> {
        let item = self.items.get(id)?;
        Some(FeedBatch {
            removed: vec![id.clone()],
            added: vec![item.moved_to(coord)],
        })
    }

    /// Move an item to another cell
    pub fn move_item(&mut self, id: &ItemId, coord: HexCoord) -> DiffEvent<ItemRef, ItemRef> {
        match self.move_batch(id, coord) {
            Some(batch) => self.apply(batch),
            None => {
                log::debug!("{}: move of absent item {} ignored", self.id, id);
                DiffEvent::new()
            }
        }
    }
}

impl fmt::Debug for CollectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSource")
            .field("id", &self.id)
            .field("items", &self.items.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
