//! Decoration stage
//!
//! Emits the primary renderable of every item plus the secondary visuals its
//! [`DecorationSpec`]s ask for:
//!
//! - **Badge**: pinned to the owner's upper-right corner, lives and dies with
//!   the owner.
//! - **Connector**: sits between the owner and another item. It is live only
//!   while both endpoints are live; while the target is absent the connector
//!   waits and is created as soon as the target arrives.
//!
//! Removing a primary cascades to every decoration touching it. Cascaded
//! decorations are emitted as removed before the primary itself, so the
//! materializer never sees a decoration outlive its owner.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::data::{DecorationSpec, DiffEvent, ItemId, ItemRef};
use crate::foundation::math::{utils::midpoint, Vec2};
use crate::hex::HexLayout;
use crate::pipeline::{StackedItem, Stage, StageCache, StageContext, StageError};
use crate::render::{Depth, RenderFault, RenderHandle, RenderOp, RenderSpec, Shape};

/// Identity of one decoration: its owner and the index of its spec
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecorationId {
    /// Item that declares the decoration
    pub owner: ItemId,
    /// Index into the owner's decoration list
    pub slot: usize,
}

impl DecorationId {
    /// Create an id
    pub fn new(owner: impl Into<ItemId>, slot: usize) -> Self {
        Self {
            owner: owner.into(),
            slot,
        }
    }
}

impl fmt::Display for DecorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.slot)
    }
}

/// Decoration flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    /// Corner label
    Badge,
    /// Link between two items
    Connector,
}

/// Live decoration renderable
#[derive(Debug, Clone)]
pub struct DecorationArtifact {
    /// Identity
    pub id: DecorationId,
    /// Flavour
    pub kind: DecorationKind,
    /// Renderable
    pub handle: RenderHandle,
    /// Planar position, when either endpoint has a coordinate
    pub position: Option<Vec2>,
    /// Stacking key (the owner's, or the higher endpoint's for connectors)
    pub depth: Depth,
    /// Declaring item
    pub owner: ItemRef,
    /// Other endpoint of a connector
    pub target: Option<ItemId>,
}

/// Identity of any node reaching the materializer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// Primary renderable of an item
    Item(ItemId),
    /// Decoration renderable
    Decoration(DecorationId),
}

impl NodeId {
    /// Item the node belongs to
    pub fn item_id(&self) -> &ItemId {
        match self {
            NodeId::Item(id) => id,
            NodeId::Decoration(id) => &id.owner,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Item(id) => write!(f, "{}", id),
            NodeId::Decoration(id) => write!(f, "{}", id),
        }
    }
}

impl From<ItemId> for NodeId {
    fn from(id: ItemId) -> Self {
        NodeId::Item(id)
    }
}

impl From<DecorationId> for NodeId {
    fn from(id: DecorationId) -> Self {
        NodeId::Decoration(id)
    }
}

/// Final pipeline artifact handed to the materializer
#[derive(Debug, Clone)]
pub enum SceneNode {
    /// An item's own renderable
    Primary(StackedItem),
    /// A decoration renderable
    Decoration(DecorationArtifact),
}

impl SceneNode {
    /// Node identity
    pub fn id(&self) -> NodeId {
        match self {
            SceneNode::Primary(stacked) => NodeId::Item(stacked.id().clone()),
            SceneNode::Decoration(decoration) => NodeId::Decoration(decoration.id.clone()),
        }
    }

    /// Renderable
    pub fn handle(&self) -> RenderHandle {
        match self {
            SceneNode::Primary(stacked) => stacked.handle(),
            SceneNode::Decoration(decoration) => decoration.handle,
        }
    }

    /// Item the node belongs to (the owner, for decorations)
    pub fn item(&self) -> &ItemRef {
        match self {
            SceneNode::Primary(stacked) => stacked.item(),
            SceneNode::Decoration(decoration) => &decoration.owner,
        }
    }

    /// Planar position
    pub fn position(&self) -> Option<Vec2> {
        match self {
            SceneNode::Primary(stacked) => stacked.position(),
            SceneNode::Decoration(decoration) => decoration.position,
        }
    }

    /// Stacking key
    pub fn depth(&self) -> Depth {
        match self {
            SceneNode::Primary(stacked) => stacked.depth,
            SceneNode::Decoration(decoration) => decoration.depth,
        }
    }

    /// Whether this is a decoration
    pub fn is_decoration(&self) -> bool {
        matches!(self, SceneNode::Decoration(_))
    }
}

/// Adds and cascades decorations around the primaries
#[derive(Debug)]
pub struct DecorationStage {
    layout: HexLayout,
    primaries: StageCache<ItemId, StackedItem>,
    decorations: StageCache<DecorationId, DecorationArtifact>,
    /// Live decorations per endpoint (owner and connector target)
    touching: HashMap<ItemId, Vec<DecorationId>>,
    /// Connectors with a live owner, keyed by the absent target
    awaiting: HashMap<ItemId, Vec<DecorationId>>,
}

impl DecorationStage {
    const NAME: &'static str = "decoration";

    /// Create the stage for a layout
    pub fn new(layout: HexLayout) -> Self {
        Self {
            layout,
            primaries: StageCache::new(Self::NAME),
            decorations: StageCache::new(Self::NAME),
            touching: HashMap::new(),
            awaiting: HashMap::new(),
        }
    }

    /// Live decoration
    pub fn get(&self, id: &DecorationId) -> Option<&DecorationArtifact> {
        self.decorations.get(id)
    }

    /// Live decorations touching `id`, as owner or connector target
    pub fn decorations_of(&self, id: &ItemId) -> &[DecorationId] {
        self.touching.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of live decorations
    pub fn decoration_count(&self) -> usize {
        self.decorations.len()
    }

    /// Number of connectors waiting for their target
    pub fn awaiting_count(&self) -> usize {
        self.awaiting.values().map(Vec::len).sum()
    }

    /// Create the renderable for a decoration whose endpoints are live
    ///
    /// Creation failures are recorded and yield `None`; the decoration then
    /// stays absent until its owner is re-added.
    fn build(&self, id: &DecorationId, ctx: &mut StageContext<'_>) -> Option<DecorationArtifact> {
        let owner = self.primaries.get(&id.owner)?;
        let size = self.layout.size();

        let (kind, target, position, depth, spec) = match owner.item().decorations.get(id.slot)? {
            DecorationSpec::Badge { .. } => {
                let offset = Vec2::new(size * 0.6, -size * 0.6);
                (
                    DecorationKind::Badge,
                    None,
                    owner.position().map(|p| p + offset),
                    owner.depth,
                    RenderSpec::new(id.to_string(), Shape::Disc, size * 0.3),
                )
            }
            DecorationSpec::Connector { to } => {
                let other = self.primaries.get(to)?;
                let position = match (owner.position(), other.position()) {
                    (Some(a), Some(b)) => Some(midpoint(a, b)),
                    (a, b) => a.or(b),
                };
                (
                    DecorationKind::Connector,
                    Some(to.clone()),
                    position,
                    owner.depth.max(other.depth),
                    RenderSpec::new(id.to_string(), Shape::Polyline, size * 0.2),
                )
            }
        };

        let handle = match ctx.backend.create_renderable(&spec) {
            Ok(handle) => handle,
            Err(error) => {
                ctx.record(RenderFault::new(id, RenderOp::Create, error));
                return None;
            }
        };
        if let Some(position) = position {
            if let Err(error) = ctx.backend.set_position(handle, position) {
                ctx.record(RenderFault::new(id, RenderOp::SetPosition, error));
            }
        }
        if let Err(error) = ctx.backend.set_depth(handle, depth) {
            ctx.record(RenderFault::new(id, RenderOp::SetDepth, error));
        }

        Some(DecorationArtifact {
            id: id.clone(),
            kind,
            handle,
            position,
            depth,
            owner: Rc::clone(owner.item()),
            target,
        })
    }

    fn link(
        &mut self,
        artifact: DecorationArtifact,
        output: &mut DiffEvent<SceneNode, NodeId>,
    ) -> Result<(), StageError> {
        self.decorations.put(artifact.id.clone(), artifact.clone())?;
        self.touching
            .entry(artifact.id.owner.clone())
            .or_default()
            .push(artifact.id.clone());
        if let Some(target) = &artifact.target {
            self.touching.entry(target.clone()).or_default().push(artifact.id.clone());
        }
        output.added.push(SceneNode::Decoration(artifact));
        Ok(())
    }

    fn remove_primary(&mut self, id: ItemId, output: &mut DiffEvent<SceneNode, NodeId>) -> Result<(), StageError> {
        for decoration_id in self.touching.remove(&id).unwrap_or_default() {
            let artifact = self.decorations.take(&decoration_id)?;
            let other = if artifact.id.owner == id {
                artifact.target
            } else {
                Some(artifact.id.owner.clone())
            };
            if let Some(other) = other {
                if let Some(list) = self.touching.get_mut(&other) {
                    list.retain(|d| *d != decoration_id);
                    if list.is_empty() {
                        self.touching.remove(&other);
                    }
                }
            }

            // A connector losing its target waits for it to come back
            if decoration_id.owner != id && self.primaries.contains(&decoration_id.owner) {
                self.awaiting.entry(id.clone()).or_default().push(decoration_id.clone());
            }
            output.removed.push(NodeId::Decoration(decoration_id));
        }

        self.awaiting.retain(|_, list| {
            list.retain(|d| d.owner != id);
            !list.is_empty()
        });

        self.primaries.take(&id)?;
        output.removed.push(NodeId::Item(id));
        Ok(())
    }

    fn add_primary(
        &mut self,
        stacked: StackedItem,
        output: &mut DiffEvent<SceneNode, NodeId>,
        ctx: &mut StageContext<'_>,
    ) -> Result<(), StageError> {
        let id = stacked.id().clone();
        let item = Rc::clone(stacked.item());
        self.primaries.put(id.clone(), stacked.clone())?;
        output.added.push(SceneNode::Primary(stacked));

        for (slot, spec) in item.decorations.iter().enumerate() {
            let decoration_id = DecorationId::new(id.clone(), slot);
            if let DecorationSpec::Connector { to } = spec {
                if *to == id {
                    log::warn!("{}: {} connects {} to itself, skipped", Self::NAME, decoration_id, id);
                    continue;
                }
                if !self.primaries.contains(to) {
                    log::debug!("{}: {} waiting for {}", Self::NAME, decoration_id, to);
                    self.awaiting.entry(to.clone()).or_default().push(decoration_id);
                    continue;
                }
            }
            if let Some(artifact) = self.build(&decoration_id, ctx) {
                self.link(artifact, output)?;
            }
        }

        for decoration_id in self.awaiting.remove(&id).unwrap_or_default() {
            if let Some(artifact) = self.build(&decoration_id, ctx) {
                self.link(artifact, output)?;
            }
        }
        Ok(())
    }
}

impl Stage for DecorationStage {
    type Input = StackedItem;
    type Output = SceneNode;
    type Removed = NodeId;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &mut self,
        event: DiffEvent<StackedItem, ItemId>,
        ctx: &mut StageContext<'_>,
    ) -> Result<DiffEvent<SceneNode, NodeId>, StageError> {
        self.primaries
            .check_batch(event.removed.iter(), event.added.iter().map(StackedItem::id))?;

        let mut output = DiffEvent::new();
        for id in event.removed {
            self.remove_primary(id, &mut output)?;
        }
        for stacked in event.added {
            self.add_primary(stacked, &mut output, ctx)?;
        }

        log::debug!(
            "{}: -{} +{} ({} decorations live, {} awaiting)",
            Self::NAME,
            output.removed.len(),
            output.added.len(),
            self.decorations.len(),
            self.awaiting_count()
        );
        Ok(output)
    }

    fn artifact_count(&self) -> usize {
        self.primaries.len() + self.decorations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SceneConfig;
    use crate::data::{Item, ItemKind};
    use crate::pipeline::mapping::items;
    use crate::pipeline::Pipeline;
    use crate::render::HeadlessBackend;
    use approx::assert_relative_eq;

    struct Harness {
        backend: HeadlessBackend,
        pipeline: Pipeline,
        faults: Vec<RenderFault>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                backend: HeadlessBackend::default(),
                pipeline: Pipeline::new(&SceneConfig::default()),
                faults: Vec::new(),
            }
        }

        fn run(&mut self, removed: Vec<&str>, added: Vec<Item>) -> DiffEvent<SceneNode, NodeId> {
            let mut ctx = StageContext::new(&mut self.backend, &mut self.faults);
            let event = DiffEvent::from_parts(removed.into_iter().map(ItemId::from).collect(), items(added));
            self.pipeline.process(event, &mut ctx).unwrap()
        }
    }

    fn badge(label: &str) -> DecorationSpec {
        DecorationSpec::Badge { label: label.to_string() }
    }

    fn connector(to: &str) -> DecorationSpec {
        DecorationSpec::Connector { to: to.into() }
    }

    fn added_ids(event: &DiffEvent<SceneNode, NodeId>) -> Vec<String> {
        event.added.iter().map(|node| node.id().to_string()).collect()
    }

    fn removed_ids(event: &DiffEvent<SceneNode, NodeId>) -> Vec<String> {
        event.removed.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_badge_follows_owner_corner_and_depth() {
        let mut harness = Harness::new();
        let out = harness.run(vec![], vec![Item::new("a", ItemKind::Note).at((1, 1)).with_decoration(badge("new"))]);

        assert_eq!(added_ids(&out), vec!["a", "a#0"]);
        let owner = &out.added[0];
        let decoration = &out.added[1];
        assert!(decoration.is_decoration());
        assert_eq!(decoration.depth(), owner.depth());

        let (owner_pos, badge_pos) = (owner.position().unwrap(), decoration.position().unwrap());
        assert_relative_eq!(badge_pos.x - owner_pos.x, 32.0 * 0.6, epsilon = 1e-4);
        assert_relative_eq!(badge_pos.y - owner_pos.y, -32.0 * 0.6, epsilon = 1e-4);
    }

    #[test]
    fn test_removal_cascades_decorations_before_owner() {
        let mut harness = Harness::new();
        harness.run(
            vec![],
            vec![
                Item::new("b", ItemKind::Link).at((3, 0)),
                Item::new("a", ItemKind::Note)
                    .at((0, 0))
                    .with_decoration(badge("x"))
                    .with_decoration(connector("b")),
            ],
        );
        assert_eq!(harness.pipeline.decoration().decoration_count(), 2);

        let out = harness.run(vec!["a"], vec![]);
        assert_eq!(removed_ids(&out), vec!["a#0", "a#1", "a"]);
        assert_eq!(harness.pipeline.decoration().decoration_count(), 0);
        assert!(harness.pipeline.decoration().decorations_of(&"b".into()).is_empty());
    }

    #[test]
    fn test_connector_waits_for_target() {
        let mut harness = Harness::new();
        let out = harness.run(vec![], vec![Item::new("a", ItemKind::Note).at((0, 0)).with_decoration(connector("b"))]);
        assert_eq!(added_ids(&out), vec!["a"]);
        assert_eq!(harness.pipeline.decoration().awaiting_count(), 1);

        let out = harness.run(vec![], vec![Item::new("b", ItemKind::Note).at((2, 0))]);
        assert_eq!(added_ids(&out), vec!["b", "a#0"]);
        assert_eq!(harness.pipeline.decoration().awaiting_count(), 0);

        let connector = harness.pipeline.decoration().get(&DecorationId::new("a", 0)).unwrap();
        assert_eq!(connector.kind, DecorationKind::Connector);
        assert_eq!(connector.target, Some(ItemId::from("b")));
    }

    #[test]
    fn test_connector_dropped_with_target_and_restored_on_return() {
        let mut harness = Harness::new();
        harness.run(
            vec![],
            vec![
                Item::new("a", ItemKind::Note).at((0, 0)).with_decoration(connector("b")),
                Item::new("b", ItemKind::Note).at((1, 0)),
            ],
        );

        let out = harness.run(vec!["b"], vec![]);
        assert_eq!(removed_ids(&out), vec!["a#0", "b"]);
        assert_eq!(harness.pipeline.decoration().awaiting_count(), 1);

        let out = harness.run(vec![], vec![Item::new("b", ItemKind::Note).at((4, 0))]);
        assert_eq!(added_ids(&out), vec!["b", "a#0"]);
    }

    #[test]
    fn test_moving_endpoint_recreates_connector() {
        let mut harness = Harness::new();
        harness.run(
            vec![],
            vec![
                Item::new("a", ItemKind::Note).at((0, 0)).with_decoration(connector("b")),
                Item::new("b", ItemKind::Note).at((2, 0)),
            ],
        );
        let before = harness.pipeline.decoration().get(&DecorationId::new("a", 0)).unwrap().position;

        let out = harness.run(vec!["b"], vec![Item::new("b", ItemKind::Note).at((4, 0))]);
        assert_eq!(removed_ids(&out), vec!["a#0", "b"]);
        assert_eq!(added_ids(&out), vec!["b", "a#0"]);

        let after = harness.pipeline.decoration().get(&DecorationId::new("a", 0)).unwrap().position;
        assert_ne!(before, after);
    }

    #[test]
    fn test_removing_both_endpoints_leaves_nothing_waiting() {
        let mut harness = Harness::new();
        harness.run(
            vec![],
            vec![
                Item::new("a", ItemKind::Note).with_decoration(connector("b")),
                Item::new("b", ItemKind::Note),
            ],
        );

        let out = harness.run(vec!["b", "a"], vec![]);
        assert_eq!(removed_ids(&out), vec!["a#0", "b", "a"]);
        assert_eq!(harness.pipeline.decoration().awaiting_count(), 0);
        assert_eq!(harness.pipeline.decoration().artifact_count(), 0);
    }

    #[test]
    fn test_self_connector_is_skipped() {
        let mut harness = Harness::new();
        let out = harness.run(vec![], vec![Item::new("a", ItemKind::Note).with_decoration(connector("a"))]);

        assert_eq!(added_ids(&out), vec!["a"]);
        assert_eq!(harness.pipeline.decoration().awaiting_count(), 0);
    }

    #[test]
    fn test_decoration_creation_failure_is_a_fault() {
        let mut harness = Harness::new();
        harness.backend.fail_creation_after(1);
        let out = harness.run(vec![], vec![Item::new("a", ItemKind::Note).with_decoration(badge("x"))]);

        assert_eq!(added_ids(&out), vec!["a"]);
        assert_eq!(harness.faults.len(), 1);
        assert_eq!(harness.faults[0].op, RenderOp::Create);
        assert_eq!(harness.faults[0].target, "a#0");
    }
}
