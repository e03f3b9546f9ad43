//! Scene Materializer - end of the pipeline
//!
//! Owns the live set: one [`Renderable`] per node the pipeline emitted and
//! has not yet retracted. It is the only place native renderables are
//! attached to and disposed from the scene graph.
//!
//! A disposal the backend refuses is recorded as a fault and the node still
//! leaves the live set; the scene stays consistent with its sources and the
//! native resource is leaked rather than kept reachable.

use std::collections::HashMap;

use crate::data::{DiffEvent, ItemId};
use crate::foundation::collections::IdentityArena;
use crate::foundation::math::Vec2;
use crate::pipeline::{NodeId, SceneNode, StageContext};
use crate::render::{RenderBackend, RenderFault, RenderHandle, RenderOp};
use crate::scene::{InteractionFlags, Renderable};

slotmap::new_key_type! {
    /// Slot of a live renderable
    pub struct RenderableKey;
}

/// Live renderables keyed by node identity and by native handle
#[derive(Debug, Default)]
pub struct SceneMaterializer {
    live: IdentityArena<NodeId, RenderableKey, Renderable>,
    handles: HashMap<RenderHandle, NodeId>,
}

impl SceneMaterializer {
    /// Create an empty materializer
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the final pipeline event
    ///
    /// Removals are disposed and dropped, then additions are attached and
    /// tagged. Backend failures become faults; neither list is cut short.
    pub fn on_data_changed(&mut self, event: DiffEvent<SceneNode, NodeId>, ctx: &mut StageContext<'_>) {
        for node in event.removed {
            let Some(renderable) = self.live.remove(&node) else {
                log::error!("materializer: {} removed but is not live", node);
                continue;
            };
            self.handles.remove(&renderable.handle);

            if let Err(error) = ctx.backend.dispose(renderable.handle) {
                ctx.record(RenderFault::new(&node, RenderOp::Dispose, error));
                log::warn!("Continuing with removal of {} despite disposal failure", node);
            }
        }

        for node in event.added {
            let renderable = Renderable::from_node(&node);
            let (id, handle) = (renderable.node.clone(), renderable.handle);

            if let Err(error) = ctx.backend.attach(handle) {
                ctx.record(RenderFault::new(&id, RenderOp::Attach, error));
            }
            match self.live.insert(id.clone(), renderable) {
                Ok(_) => {
                    self.handles.insert(handle, id);
                }
                Err(_) => log::error!("materializer: {} added while already live", id),
            }
        }

        log::debug!("materializer: {} live", self.live.len());
    }

    /// Live renderable for a node
    pub fn get(&self, node: &NodeId) -> Option<&Renderable> {
        self.live.get(node)
    }

    /// Live renderable for an item's primary node
    pub fn get_item(&self, id: &ItemId) -> Option<&Renderable> {
        self.live.get(&NodeId::Item(id.clone()))
    }

    /// Live renderable behind a native handle
    pub fn by_handle(&self, handle: RenderHandle) -> Option<&Renderable> {
        self.handles.get(&handle).and_then(|node| self.live.get(node))
    }

    /// Number of live renderables (primaries and decorations)
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether nothing is live
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Ids of items whose primary renderable is live, sorted
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self
            .live
            .ids()
            .filter_map(|node| match node {
                NodeId::Item(id) => Some(id.clone()),
                NodeId::Decoration(_) => None,
            })
            .collect();
        ids.sort();
        ids
    }

    /// Number of live decorations
    pub fn decoration_count(&self) -> usize {
        self.live.values().filter(|r| r.is_decoration()).count()
    }

    /// Live renderables (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &Renderable> {
        self.live.values()
    }

    /// Topmost live renderable under `screen` tagged with any of `mask`
    pub fn hit_test(&self, backend: &dyn RenderBackend, screen: Vec2, mask: InteractionFlags) -> Option<&Renderable> {
        let predicate = |handle: RenderHandle| self.by_handle(handle).is_some_and(|r| r.matches(mask));
        let handle = backend.hit_test(screen, &predicate)?;
        self.by_handle(handle)
    }
}

/// Read-only view of the scene handed to interaction contexts
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    materializer: &'a SceneMaterializer,
    backend: &'a dyn RenderBackend,
}

impl<'a> SceneView<'a> {
    /// Create a view
    pub fn new(materializer: &'a SceneMaterializer, backend: &'a dyn RenderBackend) -> Self {
        Self { materializer, backend }
    }

    /// Topmost renderable under `screen` tagged with any of `mask`
    pub fn hit(&self, screen: Vec2, mask: InteractionFlags) -> Option<&'a Renderable> {
        self.materializer.hit_test(self.backend, screen, mask)
    }

    /// Screen point on the scene plane
    pub fn unproject(&self, screen: Vec2) -> Vec2 {
        self.backend.unproject(screen)
    }

    /// Live renderables
    pub fn materializer(&self) -> &'a SceneMaterializer {
        self.materializer
    }
}
