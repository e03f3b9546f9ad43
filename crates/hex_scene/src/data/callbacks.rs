//! Per-item pointer callbacks supplied by the domain layer

use std::fmt;
use std::rc::Rc;

use crate::data::ItemId;
use crate::foundation::math::Vec2;
use crate::render::RenderHandle;

/// Arguments passed to every item callback
#[derive(Debug, Clone, PartialEq)]
pub struct PointerArgs {
    /// Item that owns the claimed renderable
    pub item_id: ItemId,
    /// Claimed renderable
    pub handle: RenderHandle,
    /// Pointer position in screen pixels
    pub screen: Vec2,
    /// Pointer position on the scene plane
    pub planar: Vec2,
    /// Screen-space movement since the previous forwarded drag (zero for click/release)
    pub delta: Vec2,
}

/// Callback invoked on the scene's update thread
pub type PointerCallback = Rc<dyn Fn(&PointerArgs)>;

/// Optional click, drag and release handlers
#[derive(Clone, Default)]
pub struct ItemCallbacks {
    /// Pointer released without crossing the drag threshold
    pub on_click: Option<PointerCallback>,
    /// Pointer moved while the item is claimed
    pub on_drag: Option<PointerCallback>,
    /// Pointer released after a drag
    pub on_release: Option<PointerCallback>,
}

impl ItemCallbacks {
    /// Whether no handler is set
    pub fn is_empty(&self) -> bool {
        self.on_click.is_none() && self.on_drag.is_none() && self.on_release.is_none()
    }
}

impl fmt::Debug for ItemCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemCallbacks")
            .field("on_click", &self.on_click.is_some())
            .field("on_drag", &self.on_drag.is_some())
            .field("on_release", &self.on_release.is_some())
            .finish()
    }
}
