//! Z-stacking stage
//!
//! Assigns every item a [`Depth`]: its explicit z-index as the layer (0 when
//! absent) and a scene-wide arrival ordinal that only ever grows. An item
//! re-added after a move therefore lands on top of its layer, and an item
//! with a higher explicit z-index stays above every item with a lower one
//! regardless of arrival order.

use crate::data::{DiffEvent, ItemId, ItemRef};
use crate::foundation::math::Vec2;
use crate::pipeline::{PositionedItem, Stage, StageCache, StageContext, StageError};
use crate::render::{Depth, RenderFault, RenderHandle, RenderOp};

/// Positioned stub with its stacking key
#[derive(Debug, Clone)]
pub struct StackedItem {
    /// Upstream artifact
    pub positioned: PositionedItem,
    /// Assigned depth
    pub depth: Depth,
}

impl StackedItem {
    /// Item identity
    pub fn id(&self) -> &ItemId {
        self.positioned.id()
    }

    /// Source item
    pub fn item(&self) -> &ItemRef {
        self.positioned.item()
    }

    /// Renderable
    pub fn handle(&self) -> RenderHandle {
        self.positioned.handle()
    }

    /// Planar position, if the item has a coordinate
    pub fn position(&self) -> Option<Vec2> {
        self.positioned.position
    }
}

/// Orders renderables front to back
#[derive(Debug)]
pub struct ZStackingStage {
    next_ordinal: u64,
    cache: StageCache<ItemId, StackedItem>,
}

impl ZStackingStage {
    const NAME: &'static str = "z_stacking";

    /// Create the stage; the first arrival gets ordinal 1
    pub fn new() -> Self {
        Self {
            next_ordinal: 1,
            cache: StageCache::new(Self::NAME),
        }
    }

    /// Cached artifact for `id`
    pub fn get(&self, id: &ItemId) -> Option<&StackedItem> {
        self.cache.get(id)
    }

    /// Depth currently assigned to `id`
    pub fn depth_of(&self, id: &ItemId) -> Option<Depth> {
        self.cache.get(id).map(|stacked| stacked.depth)
    }

    fn assign(&mut self, z_index: Option<i32>) -> Depth {
        let depth = Depth::new(z_index.unwrap_or(0), self.next_ordinal);
        self.next_ordinal += 1;
        depth
    }
}

impl Default for ZStackingStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for ZStackingStage {
    type Input = PositionedItem;
    type Output = StackedItem;
    type Removed = ItemId;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &mut self,
        event: DiffEvent<PositionedItem, ItemId>,
        ctx: &mut StageContext<'_>,
    ) -> Result<DiffEvent<StackedItem, ItemId>, StageError> {
        self.cache
            .check_batch(event.removed.iter(), event.added.iter().map(PositionedItem::id))?;

        let mut output = DiffEvent::new();
        for id in event.removed {
            self.cache.take(&id)?;
            output.removed.push(id);
        }

        for positioned in event.added {
            let depth = self.assign(positioned.item().z_index);
            if let Err(error) = ctx.backend.set_depth(positioned.handle(), depth) {
                ctx.record(RenderFault::new(positioned.id(), RenderOp::SetDepth, error));
            }

            let stacked = StackedItem { positioned, depth };
            self.cache.put(stacked.id().clone(), stacked.clone())?;
            output.added.push(stacked);
        }

        log::debug!(
            "{}: -{} +{} (next ordinal {})",
            Self::NAME,
            output.removed.len(),
            output.added.len(),
            self.next_ordinal
        );
        Ok(output)
    }

    fn artifact_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Item, ItemKind};
    use crate::hex::HexLayout;
    use crate::pipeline::mapping::items;
    use crate::pipeline::{MappingStage, PositioningStage};
    use crate::render::HeadlessBackend;

    struct Harness {
        backend: HeadlessBackend,
        mapping: MappingStage,
        positioning: PositioningStage,
        stacking: ZStackingStage,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                backend: HeadlessBackend::default(),
                mapping: MappingStage::with_default_factories(HexLayout::default()),
                positioning: PositioningStage::new(HexLayout::default()),
                stacking: ZStackingStage::new(),
            }
        }

        fn run(&mut self, removed: Vec<&str>, added: Vec<Item>) -> DiffEvent<StackedItem, ItemId> {
            let mut faults = Vec::new();
            let mut ctx = StageContext::new(&mut self.backend, &mut faults);
            let event = DiffEvent::from_parts(removed.into_iter().map(ItemId::from).collect(), items(added));
            let mapped = self.mapping.process(event, &mut ctx).unwrap();
            let positioned = self.positioning.process(mapped, &mut ctx).unwrap();
            self.stacking.process(positioned, &mut ctx).unwrap()
        }

        fn depth(&self, id: &str) -> Depth {
            self.stacking.depth_of(&id.into()).unwrap()
        }
    }

    #[test]
    fn test_later_arrivals_stack_higher() {
        let mut harness = Harness::new();
        harness.run(vec![], vec![Item::new("a", ItemKind::Note).at((0, 0))]);
        harness.run(vec![], vec![Item::new("b", ItemKind::Note).at((0, 0)), Item::new("c", ItemKind::Note)]);

        assert!(harness.depth("b") > harness.depth("a"));
        assert!(harness.depth("c") > harness.depth("b"));
    }

    #[test]
    fn test_explicit_z_index_outranks_arrival_order() {
        let mut harness = Harness::new();
        let out = harness.run(vec![], vec![Item::new("top", ItemKind::Note).with_z_index(2)]);
        harness.run(vec![], vec![Item::new("late", ItemKind::Note)]);
        harness.run(vec![], vec![Item::new("sunk", ItemKind::Note).with_z_index(-1)]);

        assert!(harness.depth("top") > harness.depth("late"));
        assert!(harness.depth("late") > harness.depth("sunk"));
        assert_eq!(harness.backend.object(out.added[0].handle()).unwrap().depth.layer, 2);
    }

    #[test]
    fn test_moved_item_lands_on_top() {
        let mut harness = Harness::new();
        harness.run(
            vec![],
            vec![Item::new("a", ItemKind::Note).at((0, 0)), Item::new("b", ItemKind::Note).at((1, 0))],
        );
        assert!(harness.depth("b") > harness.depth("a"));

        harness.run(vec!["a"], vec![Item::new("a", ItemKind::Note).at((2, 0))]);
        assert!(harness.depth("a") > harness.depth("b"));
        assert_eq!(harness.stacking.artifact_count(), 2);
    }
}
