//! Interaction contexts
//!
//! A context owns a slice of the scene (by [`InteractionFlags`] mask) and
//! holds at most one claim: the renderable hit at pointer-down, kept until
//! pointer-up.

use crate::data::{Item, PointerArgs, PointerCallback};
use crate::foundation::math::Vec2;
use crate::pipeline::NodeId;
use crate::render::RenderHandle;
use crate::scene::{InteractionFlags, Renderable, SceneView};

/// Handles pointer gestures for one layer of the scene
///
/// Mirrors an event handler chain: `pointer_down` returns `true` when the
/// context takes the gesture, which stops the dispatcher from asking the
/// contexts after it.
pub trait InteractionContext {
    /// Name for logs
    fn name(&self) -> &str;

    /// Try to claim the gesture starting at `screen`
    fn pointer_down(&mut self, screen: Vec2, view: &SceneView<'_>) -> bool;

    /// Pointer moved past the drag threshold while this context holds the claim
    fn pointer_drag(&mut self, screen: Vec2, delta: Vec2, view: &SceneView<'_>);

    /// Gesture ended; the claim is released unconditionally
    fn pointer_up(&mut self, screen: Vec2, was_drag: bool, view: &SceneView<'_>);

    /// Current claim, if any
    fn claim(&self) -> Option<&Claim> {
        None
    }
}

/// The renderable a context took at pointer-down
///
/// Keyed by node identity: callbacks are resolved through the live set on
/// every event, so the claim survives the item being replaced or moved.
#[derive(Debug, Clone)]
pub struct Claim {
    /// Claimed node
    pub node: NodeId,
    /// Native renderable at pointer-down
    pub handle: RenderHandle,
}

impl Claim {
    fn from_renderable(renderable: &Renderable) -> Self {
        Self {
            node: renderable.node.clone(),
            handle: renderable.handle,
        }
    }
}

/// Claim state of an [`ItemContext`]
#[derive(Debug, Clone, Default)]
pub enum ContextState {
    /// No gesture owned
    #[default]
    Idle,
    /// Gesture owned since pointer-down
    Claimed(Claim),
}

/// Routes gestures on tagged renderables to their item's callbacks
#[derive(Debug)]
pub struct ItemContext {
    name: String,
    mask: InteractionFlags,
    state: ContextState,
}

impl ItemContext {
    /// Context claiming renderables tagged with any of `mask`
    pub fn new(name: impl Into<String>, mask: InteractionFlags) -> Self {
        Self {
            name: name.into(),
            mask,
            state: ContextState::Idle,
        }
    }

    /// Flags this context hit tests against
    pub fn mask(&self) -> InteractionFlags {
        self.mask
    }

    /// Current state
    pub fn state(&self) -> &ContextState {
        &self.state
    }

    fn invoke(
        &self,
        claim: &Claim,
        pick: impl Fn(&Item) -> Option<&PointerCallback>,
        screen: Vec2,
        delta: Vec2,
        view: &SceneView<'_>,
    ) {
        let Some((renderable, item)) = view
            .materializer()
            .get(&claim.node)
            .and_then(|renderable| renderable.item().map(|item| (renderable, item)))
        else {
            log::debug!("{}: {} is gone, callback skipped", self.name, claim.node);
            return;
        };
        if renderable.handle != claim.handle {
            log::trace!("{}: {} was rebuilt since pointer down", self.name, claim.node);
        }
        if let Some(callback) = pick(&item) {
            let args = PointerArgs {
                item_id: item.id.clone(),
                handle: renderable.handle,
                screen,
                planar: view.unproject(screen),
                delta,
            };
            callback(&args);
        }
    }
}

impl InteractionContext for ItemContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn pointer_down(&mut self, screen: Vec2, view: &SceneView<'_>) -> bool {
        match view.hit(screen, self.mask) {
            Some(renderable) => {
                log::debug!("{}: claimed {}", self.name, renderable.node);
                self.state = ContextState::Claimed(Claim::from_renderable(renderable));
                true
            }
            None => false,
        }
    }

    fn pointer_drag(&mut self, screen: Vec2, delta: Vec2, view: &SceneView<'_>) {
        if let ContextState::Claimed(claim) = &self.state {
            self.invoke(claim, |item| item.callbacks.on_drag.as_ref(), screen, delta, view);
        }
    }

    fn pointer_up(&mut self, screen: Vec2, was_drag: bool, view: &SceneView<'_>) {
        let ContextState::Claimed(claim) = std::mem::take(&mut self.state) else {
            return;
        };
        log::debug!("{}: released {} ({})", self.name, claim.node, if was_drag { "drag" } else { "click" });
        if was_drag {
            self.invoke(&claim, |item| item.callbacks.on_release.as_ref(), screen, Vec2::zeros(), view);
        } else {
            self.invoke(&claim, |item| item.callbacks.on_click.as_ref(), screen, Vec2::zeros(), view);
        }
    }

    fn claim(&self) -> Option<&Claim> {
        match &self.state {
            ContextState::Claimed(claim) => Some(claim),
            ContextState::Idle => None,
        }
    }
}

/// Lowest-priority context for the backdrop; never claims
#[derive(Debug, Default)]
pub struct BackgroundContext;

impl InteractionContext for BackgroundContext {
    fn name(&self) -> &str {
        "background"
    }

    fn pointer_down(&mut self, screen: Vec2, view: &SceneView<'_>) -> bool {
        if view.hit(screen, InteractionFlags::BACKGROUND).is_some() {
            log::trace!("background: pointer down at ({}, {}) left unclaimed", screen.x, screen.y);
        }
        false
    }

    fn pointer_drag(&mut self, _screen: Vec2, _delta: Vec2, _view: &SceneView<'_>) {}

    fn pointer_up(&mut self, _screen: Vec2, _was_drag: bool, _view: &SceneView<'_>) {}
}
