//! Positioning stage: hex coordinate → planar position

use crate::data::{DiffEvent, ItemId, ItemRef};
use crate::foundation::math::Vec2;
use crate::hex::HexLayout;
use crate::pipeline::{MappedItem, Stage, StageCache, StageContext, StageError};
use crate::render::{RenderFault, RenderHandle, RenderOp};

/// Stub with its planar position applied
#[derive(Debug, Clone)]
pub struct PositionedItem {
    /// Upstream artifact
    pub mapped: MappedItem,
    /// Cell center, or `None` when the item carries no coordinate
    pub position: Option<Vec2>,
}

impl PositionedItem {
    /// Item identity
    pub fn id(&self) -> &ItemId {
        self.mapped.id()
    }

    /// Source item
    pub fn item(&self) -> &ItemRef {
        &self.mapped.item
    }

    /// Renderable
    pub fn handle(&self) -> RenderHandle {
        self.mapped.handle
    }
}

/// Places coordinate-bearing items at their cell center
///
/// Never creates or destroys renderables; items without a coordinate pass
/// through untouched.
#[derive(Debug)]
pub struct PositioningStage {
    layout: HexLayout,
    cache: StageCache<ItemId, PositionedItem>,
}

impl PositioningStage {
    const NAME: &'static str = "positioning";

    /// Create the stage for a layout
    pub fn new(layout: HexLayout) -> Self {
        Self {
            layout,
            cache: StageCache::new(Self::NAME),
        }
    }

    /// Layout used for every item
    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    /// Cached artifact for `id`
    pub fn get(&self, id: &ItemId) -> Option<&PositionedItem> {
        self.cache.get(id)
    }
}

impl Stage for PositioningStage {
    type Input = MappedItem;
    type Output = PositionedItem;
    type Removed = ItemId;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &mut self,
        event: DiffEvent<MappedItem, ItemId>,
        ctx: &mut StageContext<'_>,
    ) -> Result<DiffEvent<PositionedItem, ItemId>, StageError> {
        self.cache.check_batch(event.removed.iter(), event.added.iter().map(MappedItem::id))?;

        let mut output = DiffEvent::new();
        for id in event.removed {
            self.cache.take(&id)?;
            output.removed.push(id);
        }

        for mapped in event.added {
            let position = mapped.item.coordinate.map(|coord| self.layout.to_pixel(coord));
            if let Some(position) = position {
                if let Err(error) = ctx.backend.set_position(mapped.handle, position) {
                    ctx.record(RenderFault::new(mapped.id(), RenderOp::SetPosition, error));
                }
            }

            let positioned = PositionedItem { mapped, position };
            self.cache.put(positioned.id().clone(), positioned.clone())?;
            output.added.push(positioned);
        }

        log::debug!("{}: -{} +{}", Self::NAME, output.removed.len(), output.added.len());
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
    use crate::hex::{HexCoord, HexOrientation};
    use crate::pipeline::mapping::items;
    use crate::pipeline::MappingStage;
    use crate::render::HeadlessBackend;
    use approx::assert_relative_eq;

    struct Harness {
        backend: HeadlessBackend,
        mapping: MappingStage,
        positioning: PositioningStage,
    }

    impl Harness {
        fn new() -> Self {
            let layout = HexLayout::new(HexOrientation::Pointy, 10.0, Vec2::zeros());
            Self {
                backend: HeadlessBackend::default(),
                mapping: MappingStage::with_default_factories(layout),
                positioning: PositioningStage::new(layout),
            }
        }

        fn run(&mut self, removed: Vec<&str>, added: Vec<Item>) -> DiffEvent<PositionedItem, ItemId> {
            let mut faults = Vec::new();
            let mut ctx = StageContext::new(&mut self.backend, &mut faults);
            let event = DiffEvent::from_parts(removed.into_iter().map(ItemId::from).collect(), items(added));
            let mapped = self.mapping.process(event, &mut ctx).unwrap();
            self.positioning.process(mapped, &mut ctx).unwrap()
        }
    }

    #[test]
    fn test_applies_cell_center_to_renderable() {
        let mut harness = Harness::new();
        let out = harness.run(vec![], vec![Item::new("a", ItemKind::Note).at((0, 2))]);

        let position = out.added[0].position.unwrap();
        assert_relative_eq!(position.y, 30.0, epsilon = 1e-4);
        let object = harness.backend.object(out.added[0].handle()).unwrap();
        assert_relative_eq!(object.position.x, position.x);
        assert_relative_eq!(object.position.y, position.y);
    }

    #[test]
    fn test_item_without_coordinate_passes_through() {
        let mut harness = Harness::new();
        let out = harness.run(vec![], vec![Item::new("free", ItemKind::Vector)]);

        assert!(out.added[0].position.is_none());
        let object = harness.backend.object(out.added[0].handle()).unwrap();
        assert_eq!(object.position, Vec2::zeros());
    }

    #[test]
    fn test_move_repositions_same_identity() {
        let mut harness = Harness::new();
        harness.run(vec![], vec![Item::new("a", ItemKind::Link).at((0, 0))]);
        let out = harness.run(vec!["a"], vec![Item::new("a", ItemKind::Link).at((1, 0))]);

        assert_eq!(out.removed, vec![ItemId::from("a")]);
        assert_eq!(out.added.len(), 1);
        assert_eq!(harness.positioning.artifact_count(), 1);
        let expected = harness.positioning.layout().to_pixel(HexCoord::new(1, 0));
        assert_eq!(harness.positioning.get(&"a".into()).unwrap().position, Some(expected));
    }
}
