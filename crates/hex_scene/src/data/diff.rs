//! Diff events passed between pipeline stages

/// Ordered removals and additions describing one change
///
/// Consumers process every entry of `removed` before any entry of `added`,
/// so an id may appear in both lists to express a replace. The order of
/// `added` is significant.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEvent<A, R> {
    /// Entries that left the collection
    pub removed: Vec<R>,
    /// Entries that joined the collection
    pub added: Vec<A>,
}

impl<A, R> DiffEvent<A, R> {
    /// Create an empty event
    pub fn new() -> Self {
        Self {
            removed: Vec::new(),
            added: Vec::new(),
        }
    }

    /// Create an event from both lists
    pub fn from_parts(removed: Vec<R>, added: Vec<A>) -> Self {
        Self { removed, added }
    }

    /// Whether the event carries no change
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.removed.len() + self.added.len()
    }

    /// Convert the removed entries, keeping order
    pub fn map_removed<R2>(self, f: impl FnMut(R) -> R2) -> DiffEvent<A, R2> {
        DiffEvent {
            removed: self.removed.into_iter().map(f).collect(),
            added: self.added,
        }
    }
}

impl<A, R> Default for DiffEvent<A, R> {
    fn default() -> Self {
        Self::new()
    }
}
