//! Hex Scene - façade over sources, pipeline, materializer and input
//!
//! One update thread drives everything: feed batches go through
//! [`HexScene::apply`], pointer input through [`HexScene::pointer_down`] and
//! friends. A batch is all or nothing: if any stage rejects it, the source
//! is left untouched and no renderable changes.

use thiserror::Error;

use crate::core::config::{ConfigError, SceneConfig};
use crate::data::{CollectionSource, DataListener, FeedBatch, Item, ItemId, ItemRef, SourceId};
use crate::foundation::math::Vec2;
use crate::hex::HexCoord;
use crate::input::{BackgroundContext, ContextStack, InteractionContext, ItemContext, PointerEvent};
use crate::pipeline::{MappingStage, NodeId, Pipeline, SceneNode, StageContext, StageError};
use crate::render::{RenderBackend, RenderFault};
use crate::scene::{InteractionFlags, SceneMaterializer, SceneView};

/// Scene-level errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// A stage rejected the batch
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Batch addressed to a source this scene does not host
    #[error("unknown source {0}")]
    UnknownSource(SourceId),

    /// Configuration failed validation
    #[error("invalid scene configuration: {0}")]
    Config(#[from] ConfigError),
}

/// What one applied batch changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneUpdate {
    /// Nodes that left the live set, in removal order
    pub removed: Vec<NodeId>,
    /// Nodes that joined the live set, in addition order
    pub added: Vec<NodeId>,
    /// Recoverable backend failures hit while applying the batch
    pub faults: Vec<RenderFault>,
}

impl SceneUpdate {
    /// Whether nothing changed and nothing failed
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.faults.is_empty()
    }
}

/// A hex-grid scene over a render backend
pub struct HexScene<B: RenderBackend> {
    config: SceneConfig,
    backend: B,
    sources: Vec<CollectionSource>,
    pipeline: Pipeline,
    materializer: SceneMaterializer,
    contexts: ContextStack,
}

impl<B: RenderBackend> HexScene<B> {
    /// Create a scene with the built-in mapping for every item kind
    pub fn new(config: SceneConfig, backend: B) -> Result<Self, SceneError> {
        config.validate()?;
        let pipeline = Pipeline::new(&config);
        Ok(Self::assemble(config, backend, pipeline))
    }

    /// Create a scene with a custom mapping registry
    pub fn with_mapping(config: SceneConfig, backend: B, mapping: MappingStage) -> Result<Self, SceneError> {
        config.validate()?;
        let pipeline = Pipeline::with_mapping(mapping, &config);
        Ok(Self::assemble(config, backend, pipeline))
    }

    /// Wire the default contexts: cells first, then free items, then the backdrop
    fn assemble(config: SceneConfig, backend: B, pipeline: Pipeline) -> Self {
        let mut contexts = ContextStack::new(config.interaction.drag_threshold);
        contexts.push(Box::new(ItemContext::new("cells", InteractionFlags::CELL_ITEM)));
        contexts.push(Box::new(ItemContext::new("generic", InteractionFlags::GENERIC_ITEM)));
        contexts.push(Box::new(BackgroundContext));

        log::info!(
            "hex scene ready: {:?} layout, size {}, {} interaction contexts",
            config.layout.orientation,
            config.layout.size,
            contexts.len()
        );
        Self {
            config,
            backend,
            sources: Vec::new(),
            pipeline,
            materializer: SceneMaterializer::new(),
            contexts,
        }
    }

    /// Host a new, empty source
    pub fn add_source(&mut self) -> SourceId {
        let id = SourceId(self.sources.len());
        self.sources.push(CollectionSource::new(id));
        log::info!("added {}", id);
        id
    }

    /// A hosted source
    pub fn source(&self, id: SourceId) -> Option<&CollectionSource> {
        self.sources.get(id.0)
    }

    /// Observe committed changes of a source
    pub fn add_listener(&mut self, source: SourceId, listener: Box<dyn DataListener>) -> Result<(), SceneError> {
        self.source_mut(source)?.add_listener(listener);
        Ok(())
    }

    /// Apply one feed batch to a source and propagate it to the scene
    ///
    /// On error nothing changed: not the source, not the stages, not the
    /// backend.
    pub fn apply(&mut self, source: SourceId, batch: FeedBatch) -> Result<SceneUpdate, SceneError> {
        let event = self.source_mut(source)?.diff(batch);
        if event.is_empty() {
            return Ok(SceneUpdate::default());
        }

        let mut faults = Vec::new();
        let mut ctx = StageContext::new(&mut self.backend, &mut faults);
        let nodes = self
            .pipeline
            .process(event.clone().map_removed(|item: ItemRef| item.id.clone()), &mut ctx)?;

        let removed = nodes.removed.clone();
        let added = nodes.added.iter().map(SceneNode::id).collect();
        self.materializer.on_data_changed(nodes, &mut ctx);
        self.sources[source.0].commit(&event);

        log::debug!(
            "{}: applied -{} +{}, {} live, {} faults",
            source,
            event.removed.len(),
            event.added.len(),
            self.materializer.len(),
            faults.len()
        );
        Ok(SceneUpdate { removed, added, faults })
    }

    /// Add or replace one item
    pub fn insert(&mut self, source: SourceId, item: Item) -> Result<SceneUpdate, SceneError> {
        self.apply(source, FeedBatch::adding([item]))
    }

    /// Remove one item; a no-op when absent
    pub fn remove(&mut self, source: SourceId, id: &ItemId) -> Result<SceneUpdate, SceneError> {
        self.apply(source, FeedBatch::removing([id.clone()]))
    }

    /// Move an item to another cell; a no-op when absent
    pub fn move_item(&mut self, source: SourceId, id: &ItemId, coord: HexCoord) -> Result<SceneUpdate, SceneError> {
        match self.source_mut(source)?.move_batch(id, coord) {
            Some(batch) => self.apply(source, batch),
            None => {
                log::debug!("{}: move of absent item {} ignored", source, id);
                Ok(SceneUpdate::default())
            }
        }
    }

    /// Register an interaction context below the existing ones
    pub fn push_context(&mut self, context: Box<dyn InteractionContext>) {
        self.contexts.push(context);
    }

    /// Pointer pressed; returns whether a context claimed the gesture
    pub fn pointer_down(&mut self, screen: Vec2) -> bool {
        let view = SceneView::new(&self.materializer, &self.backend);
        self.contexts.pointer_down(screen, &view)
    }

    /// Pointer moved
    pub fn pointer_move(&mut self, screen: Vec2) {
        let view = SceneView::new(&self.materializer, &self.backend);
        self.contexts.pointer_move(screen, &view);
    }

    /// Pointer released; `Some(was_drag)` when a claimed gesture ended
    pub fn pointer_up(&mut self, screen: Vec2) -> Option<bool> {
        let view = SceneView::new(&self.materializer, &self.backend);
        self.contexts.pointer_up(screen, &view)
    }

    /// Dispatch a raw pointer event
    pub fn dispatch(&mut self, event: PointerEvent) -> bool {
        let view = SceneView::new(&self.materializer, &self.backend);
        self.contexts.dispatch(event, &view)
    }

    /// Ids of items with a live primary renderable, sorted
    pub fn live_item_ids(&self) -> Vec<ItemId> {
        self.materializer.item_ids()
    }

    /// Scene configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Render backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Render backend, mutably (camera control, fault injection)
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Live renderables
    pub fn materializer(&self) -> &SceneMaterializer {
        &self.materializer
    }

    /// Pipeline stages
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Interaction contexts
    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    fn source_mut(&mut self, id: SourceId) -> Result<&mut CollectionSource, SceneError> {
        self.sources.get_mut(id.0).ok_or_else(|| {
            log::warn!("batch for unknown {} rejected", id);
            SceneError::UnknownSource(id)
        })
    }
}

impl<B: RenderBackend> std::fmt::Debug for HexScene<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HexScene")
            .field("sources", &self.sources.len())
            .field("pipeline", &self.pipeline)
            .field("live", &self.materializer.len())
            .field("contexts", &self.contexts)
            .finish()
    }
}
