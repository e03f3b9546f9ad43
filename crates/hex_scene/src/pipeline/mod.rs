//! # Incremental Scene Pipeline
//!
//! Turns collection diffs into renderable scene nodes through a fixed chain
//! of stages:
//!
//! ```text
//! CollectionSource
//!      ↓  DiffEvent<ItemRef, ItemId>
//! MappingStage      (kind → renderable stub)
//!      ↓  DiffEvent<MappedItem, ItemId>
//! PositioningStage  (hex → planar position)
//!      ↓  DiffEvent<PositionedItem, ItemId>
//! ZStackingStage    (explicit layer / arrival order)
//!      ↓  DiffEvent<StackedItem, ItemId>
//! DecorationStage   (badges, connectors, cascade removal)
//!      ↓  DiffEvent<SceneNode, NodeId>
//! SceneMaterializer
//! ```
//!
//! Every stage owns an identity-keyed cache, handles all removals of an
//! event before its additions and emits exactly one event downstream per
//! event received. The chain is wired by type, so a stage can only be fed
//! by the stage whose output it accepts.

mod cache;
mod mapping;
mod positioning;
mod z_stacking;
mod decoration;

pub use cache::{ArtifactKey, StageCache};
pub use mapping::{default_spec, Factory, MappedItem, MappingStage};
pub use positioning::{PositionedItem, PositioningStage};
pub use z_stacking::{StackedItem, ZStackingStage};
pub use decoration::{
    DecorationArtifact, DecorationId, DecorationKind, DecorationStage, NodeId, SceneNode,
};

use thiserror::Error;

use crate::core::config::SceneConfig;
use crate::data::{DiffEvent, ItemId, ItemKind, ItemRef};
use crate::render::{RenderBackend, RenderError, RenderFault};

/// Errors that reject a whole batch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// No factory is registered for an item's kind
    #[error("{stage}: no factory registered for kind {kind:?} (item {id})")]
    UnknownKind {
        /// Stage that rejected the batch
        stage: &'static str,
        /// Offending item
        id: ItemId,
        /// Its kind
        kind: ItemKind,
    },

    /// Removal of an id with no cached artifact (upstream ordering violation)
    #[error("{stage}: {id} removed but has no cached artifact")]
    MissingArtifact {
        /// Stage that detected it
        stage: &'static str,
        /// Offending id
        id: String,
    },

    /// Addition of an id whose artifact is still cached
    #[error("{stage}: {id} added while its artifact is still cached")]
    DuplicateArtifact {
        /// Stage that detected it
        stage: &'static str,
        /// Offending id
        id: String,
    },

    /// Backend could not create a renderable
    #[error("{stage}: backend failed for {id}: {source}")]
    Render {
        /// Stage that called the backend
        stage: &'static str,
        /// Item being created
        id: ItemId,
        /// Backend error
        #[source]
        source: RenderError,
    },
}

/// Per-event environment handed to every stage
pub struct StageContext<'a> {
    /// Engine capability surface
    pub backend: &'a mut dyn RenderBackend,
    /// Sink for per-renderable failures that do not reject the batch
    pub faults: &'a mut Vec<RenderFault>,
}

impl<'a> StageContext<'a> {
    /// Create a context
    pub fn new(backend: &'a mut dyn RenderBackend, faults: &'a mut Vec<RenderFault>) -> Self {
        Self { backend, faults }
    }

    /// Log and keep a recoverable failure
    pub fn record(&mut self, fault: RenderFault) {
        log::error!("{}", fault);
        self.faults.push(fault);
    }
}

/// One transform in the pipeline
pub trait Stage {
    /// Artifacts received from upstream
    type Input;
    /// Artifacts emitted downstream
    type Output;
    /// Identities emitted downstream as removed
    type Removed;

    /// Stage name for logs and errors
    fn name(&self) -> &'static str;

    /// Process one event: all removals, then all additions, one output event
    fn process(
        &mut self,
        event: DiffEvent<Self::Input, ItemId>,
        ctx: &mut StageContext<'_>,
    ) -> Result<DiffEvent<Self::Output, Self::Removed>, StageError>;

    /// Number of cached artifacts
    fn artifact_count(&self) -> usize;
}

/// The four stages, wired in their fixed order
pub struct Pipeline {
    mapping: MappingStage,
    positioning: PositioningStage,
    stacking: ZStackingStage,
    decoration: DecorationStage,
}

impl Pipeline {
    /// Pipeline with the built-in factory for every item kind
    pub fn new(config: &SceneConfig) -> Self {
        Self::with_mapping(MappingStage::with_default_factories(config.layout.layout()), config)
    }

    /// Pipeline with a custom mapping registry
    pub fn with_mapping(mapping: MappingStage, config: &SceneConfig) -> Self {
        let layout = config.layout.layout();
        Self {
            mapping,
            positioning: PositioningStage::new(layout),
            stacking: ZStackingStage::new(),
            decoration: DecorationStage::new(layout),
        }
    }

    /// Run one source event through every stage
    pub fn process(
        &mut self,
        event: DiffEvent<ItemRef, ItemId>,
        ctx: &mut StageContext<'_>,
    ) -> Result<DiffEvent<SceneNode, NodeId>, StageError> {
        let mapped = self.mapping.process(event, ctx)?;
        let positioned = self.positioning.process(mapped, ctx)?;
        let stacked = self.stacking.process(positioned, ctx)?;
        self.decoration.process(stacked, ctx)
    }

    /// Mapping stage
    pub fn mapping(&self) -> &MappingStage {
        &self.mapping
    }

    /// Mapping stage, for registering factories
    pub fn mapping_mut(&mut self) -> &mut MappingStage {
        &mut self.mapping
    }

    /// Positioning stage
    pub fn positioning(&self) -> &PositioningStage {
        &self.positioning
    }

    /// Z-stacking stage
    pub fn stacking(&self) -> &ZStackingStage {
        &self.stacking
    }

    /// Decoration stage
    pub fn decoration(&self) -> &DecorationStage {
        &self.decoration
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("mapping", &self.mapping.artifact_count())
            .field("positioning", &self.positioning.artifact_count())
            .field("stacking", &self.stacking.artifact_count())
            .field("decoration", &self.decoration.artifact_count())
            .finish()
    }
}
