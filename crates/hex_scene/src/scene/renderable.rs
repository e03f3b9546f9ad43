//! Renderable representation held by the materializer
//!
//! This is the scene-side record of one attached native renderable. It
//! carries the interaction tags used for hit-test filtering and a weak
//! back-reference to the item, so a renderable never keeps its item alive.

use std::rc::{Rc, Weak};

use bitflags::bitflags;

use crate::data::{Item, ItemKind, ItemRef};
use crate::foundation::math::Vec2;
use crate::pipeline::{NodeId, SceneNode};
use crate::render::{Depth, RenderHandle};

bitflags! {
    /// Interaction tags used to route hit tests to contexts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InteractionFlags: u8 {
        /// Primary renderable of an item placed on a cell
        const CELL_ITEM = 1 << 0;
        /// Primary renderable of an item without a cell
        const GENERIC_ITEM = 1 << 1;
        /// Scene backdrop
        const BACKGROUND = 1 << 2;
        /// Badge or connector
        const DECORATION = 1 << 3;
    }
}

impl InteractionFlags {
    /// Tags for a node leaving the pipeline
    pub fn for_node(node: &SceneNode) -> Self {
        match node {
            SceneNode::Decoration(_) => Self::DECORATION,
            SceneNode::Primary(stacked) => {
                let item = stacked.item();
                if item.kind == ItemKind::Background {
                    Self::BACKGROUND
                } else if item.coordinate.is_some() {
                    Self::CELL_ITEM
                } else {
                    Self::GENERIC_ITEM
                }
            }
        }
    }
}

/// One live, attached renderable
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Node identity
    pub node: NodeId,

    /// Native renderable
    pub handle: RenderHandle,

    /// Interaction tags
    pub flags: InteractionFlags,

    /// Item the node belongs to (owner, for decorations); not owned
    pub item: Weak<Item>,

    /// Planar position, if placed
    pub position: Option<Vec2>,

    /// Stacking key
    pub depth: Depth,
}

impl Renderable {
    /// Build the record for a node
    pub fn from_node(node: &SceneNode) -> Self {
        Self {
            node: node.id(),
            handle: node.handle(),
            flags: InteractionFlags::for_node(node),
            item: Rc::downgrade(node.item()),
            position: node.position(),
            depth: node.depth(),
        }
    }

    /// Item, if it is still alive
    pub fn item(&self) -> Option<ItemRef> {
        self.item.upgrade()
    }

    /// Whether any of `mask` is set on this renderable
    pub fn matches(&self, mask: InteractionFlags) -> bool {
        self.flags.intersects(mask)
    }

    /// Whether this is a decoration
    pub fn is_decoration(&self) -> bool {
        matches!(self.node, NodeId::Decoration(_))
    }
}
