//! Mapping stage: item kind → renderable stub

use std::collections::HashMap;

use crate::data::{DiffEvent, Item, ItemId, ItemKind, ItemRef};
use crate::foundation::math::constants::SQRT_3;
use crate::hex::HexLayout;
use crate::pipeline::{Stage, StageCache, StageContext, StageError};
use crate::render::{RenderHandle, RenderSpec, Shape};

/// Builds the creation spec for one item
pub type Factory = Box<dyn Fn(&Item, &HexLayout) -> RenderSpec>;

/// Renderable stub produced for one item; not yet positioned or stacked
#[derive(Debug, Clone)]
pub struct MappedItem {
    /// Source item
    pub item: ItemRef,
    /// Renderable created for it
    pub handle: RenderHandle,
}

impl MappedItem {
    /// Item identity
    pub fn id(&self) -> &ItemId {
        &self.item.id
    }

    /// Item kind
    pub fn kind(&self) -> ItemKind {
        self.item.kind
    }
}

/// Built-in spec for each kind
///
/// The label is the item id so diagnostics and fault injection can name a
/// specific item.
pub fn default_spec(item: &Item, layout: &HexLayout) -> RenderSpec {
    let size = layout.size();
    let (shape, radius) = match item.kind {
        ItemKind::Link
        | ItemKind::Note
        | ItemKind::Media
        | ItemKind::Model
        | ItemKind::Container
        | ItemKind::File => (Shape::Hexagon, size * SQRT_3 / 2.0),
        ItemKind::Vector => (Shape::Polyline, size * 0.5),
        ItemKind::Badge => (Shape::Disc, size * 0.4),
        ItemKind::Background => (Shape::Backdrop, f32::INFINITY),
    };
    RenderSpec::new(item.id.as_str(), shape, radius)
}

/// Maps raw items to renderable stubs through a `kind → factory` registry
pub struct MappingStage {
    layout: HexLayout,
    factories: HashMap<ItemKind, Factory>,
    cache: StageCache<ItemId, MappedItem>,
}

impl MappingStage {
    const NAME: &'static str = "mapping";

    /// Stage with an empty registry
    pub fn new(layout: HexLayout) -> Self {
        Self {
            layout,
            factories: HashMap::new(),
            cache: StageCache::new(Self::NAME),
        }
    }

    /// Stage with [`default_spec`] registered for every kind
    pub fn with_default_factories(layout: HexLayout) -> Self {
        let mut stage = Self::new(layout);
        for kind in ItemKind::ALL {
            stage.register(kind, default_spec);
        }
        stage
    }

    /// Register (or replace) the factory for `kind`
    pub fn register(&mut self, kind: ItemKind, factory: impl Fn(&Item, &HexLayout) -> RenderSpec + 'static) {
        self.factories.insert(kind, Box::new(factory));
    }

    /// Remove the factory for `kind`; returns whether one was registered
    pub fn unregister(&mut self, kind: ItemKind) -> bool {
        self.factories.remove(&kind).is_some()
    }

    /// Whether `kind` can be mapped
    pub fn has_factory(&self, kind: ItemKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Cached stub for `id`
    pub fn get(&self, id: &ItemId) -> Option<&MappedItem> {
        self.cache.get(id)
    }

    fn spec_for(&self, item: &Item) -> Result<RenderSpec, StageError> {
        let factory = self.factories.get(&item.kind).ok_or_else(|| {
            let error = StageError::UnknownKind {
                stage: Self::NAME,
                id: item.id.clone(),
                kind: item.kind,
            };
            log::error!("rejecting batch: {}", error);
            error
        })?;
        Ok(factory(item, &self.layout))
    }
}

impl Stage for MappingStage {
    type Input = ItemRef;
    type Output = MappedItem;
    type Removed = ItemId;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &mut self,
        event: DiffEvent<ItemRef, ItemId>,
        ctx: &mut StageContext<'_>,
    ) -> Result<DiffEvent<MappedItem, ItemId>, StageError> {
        self.cache
            .check_batch(event.removed.iter(), event.added.iter().map(|item| &item.id))?;

        let specs = event
            .added
            .iter()
            .map(|item| self.spec_for(item))
            .collect::<Result<Vec<_>, _>>()?;

        // Create every renderable before touching the cache so a backend
        // failure leaves this stage exactly as it was.
        let mut created = Vec::with_capacity(specs.len());
        for (item, spec) in event.added.iter().zip(&specs) {
            match ctx.backend.create_renderable(spec) {
                Ok(handle) => created.push(handle),
                Err(source) => {
                    for handle in created {
                        if let Err(e) = ctx.backend.dispose(handle) {
                            log::warn!("rollback of {:?} failed: {}", handle, e);
                        }
                    }
                    let error = StageError::Render {
                        stage: Self::NAME,
                        id: item.id.clone(),
                        source,
                    };
                    log::error!("rejecting batch: {}", error);
                    return Err(error);
                }
            }
        }

        let mut output = DiffEvent::new();
        for id in event.removed {
            self.cache.take(&id)?;
            output.removed.push(id);
        }
        for (item, handle) in event.added.into_iter().zip(created) {
            let mapped = MappedItem { item, handle };
            self.cache.put(mapped.id().clone(), mapped.clone())?;
            output.added.push(mapped);
        }

        log::debug!(
            "{}: -{} +{} ({} cached)",
            Self::NAME,
            output.removed.len(),
            output.added.len(),
            self.cache.len()
        );
        Ok(output)
    }

    fn artifact_count(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for MappingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingStage")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .field("cache", &self.cache.len())
            .finish()
    }
}

/// Shorthand used by tests across the pipeline
#[cfg(test)]
pub(crate) fn items(list: impl IntoIterator<Item = Item>) -> Vec<ItemRef> {
    list.into_iter().map(std::rc::Rc::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessBackend, RenderFault};

    fn run(
        stage: &mut MappingStage,
        backend: &mut HeadlessBackend,
        removed: Vec<&str>,
        added: Vec<ItemRef>,
    ) -> Result<DiffEvent<MappedItem, ItemId>, StageError> {
        let mut faults: Vec<RenderFault> = Vec::new();
        let mut ctx = StageContext::new(backend, &mut faults);
        let event = DiffEvent::from_parts(removed.into_iter().map(ItemId::from).collect(), added);
        stage.process(event, &mut ctx)
    }

    #[test]
    fn test_maps_each_item_to_one_stub_in_order() {
        let mut backend = HeadlessBackend::default();
        let mut stage = MappingStage::with_default_factories(HexLayout::default());

        let out = run(
            &mut stage,
            &mut backend,
            vec![],
            items([Item::new("a", ItemKind::Note), Item::new("b", ItemKind::Badge)]),
        )
        .unwrap();

        let ids: Vec<_> = out.added.iter().map(|m| m.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(backend.object(out.added[1].handle).unwrap().spec.shape, Shape::Disc);
        assert_eq!(stage.artifact_count(), 2);
    }

    #[test]
    fn test_unknown_kind_rejects_whole_batch() {
        let mut backend = HeadlessBackend::default();
        let mut stage = MappingStage::with_default_factories(HexLayout::default());
        assert!(stage.unregister(ItemKind::Model));

        let result = run(
            &mut stage,
            &mut backend,
            vec![],
            items([Item::new("ok", ItemKind::Note), Item::new("bad", ItemKind::Model)]),
        );

        assert!(matches!(result, Err(StageError::UnknownKind { kind: ItemKind::Model, .. })));
        assert_eq!(stage.artifact_count(), 0);
        assert_eq!(backend.object_count(), 0);
    }

    #[test]
    fn test_creation_failure_rolls_back_batch() {
        let mut backend = HeadlessBackend::default();
        let mut stage = MappingStage::with_default_factories(HexLayout::default());
        run(&mut stage, &mut backend, vec![], items([Item::new("keep", ItemKind::Note)])).unwrap();

        backend.fail_creation_after(1);
        let result = run(
            &mut stage,
            &mut backend,
            vec!["keep"],
            items([Item::new("x", ItemKind::Note), Item::new("y", ItemKind::Note)]),
        );

        assert!(matches!(result, Err(StageError::Render { .. })));
        assert!(stage.get(&"keep".into()).is_some());
        assert!(stage.get(&"x".into()).is_none());
        assert_eq!(backend.object_count(), 1);
    }

    #[test]
    fn test_removal_of_uncached_id_fails_loudly() {
        let mut backend = HeadlessBackend::default();
        let mut stage = MappingStage::with_default_factories(HexLayout::default());

        let result = run(&mut stage, &mut backend, vec!["ghost"], vec![]);
        assert!(matches!(result, Err(StageError::MissingArtifact { .. })));
    }

    #[test]
    fn test_remove_and_readd_same_id_in_one_batch() {
        let mut backend = HeadlessBackend::default();
        let mut stage = MappingStage::with_default_factories(HexLayout::default());
        let first = run(&mut stage, &mut backend, vec![], items([Item::new("a", ItemKind::Link)])).unwrap();

        let second = run(&mut stage, &mut backend, vec!["a"], items([Item::new("a", ItemKind::Link)])).unwrap();

        assert_eq!(second.removed, vec![ItemId::from("a")]);
        assert_ne!(second.added[0].handle, first.added[0].handle);
        assert_eq!(stage.artifact_count(), 1);
    }
}
