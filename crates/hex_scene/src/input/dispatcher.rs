//! Context stack - pointer gesture dispatch
//!
//! Follows a chain of responsibility: on pointer-down every context is asked
//! in registration order and the first one that claims owns the gesture
//! until pointer-up. Moves and the release go to that owner only.

use crate::foundation::math::Vec2;
use crate::input::{Gesture, InteractionContext, PointerEvent};
use crate::scene::SceneView;

/// Ordered interaction contexts with at most one active gesture
pub struct ContextStack {
    contexts: Vec<Box<dyn InteractionContext>>,
    active: Option<(usize, Gesture)>,
    drag_threshold: f32,
}

impl ContextStack {
    /// Create an empty stack
    pub fn new(drag_threshold: f32) -> Self {
        Self {
            contexts: Vec::new(),
            active: None,
            drag_threshold,
        }
    }

    /// Register a context below every context registered so far
    pub fn push(&mut self, context: Box<dyn InteractionContext>) {
        log::debug!("registered interaction context '{}' at priority {}", context.name(), self.contexts.len());
        self.contexts.push(context);
    }

    /// Number of contexts
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no context is registered
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Context names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.contexts.iter().map(|context| context.name()).collect()
    }

    /// Context by priority index
    pub fn get(&self, index: usize) -> Option<&dyn InteractionContext> {
        self.contexts.get(index).map(|context| context.as_ref())
    }

    /// Name of the context owning the current gesture
    pub fn active_context(&self) -> Option<&str> {
        self.active.as_ref().map(|(index, _)| self.contexts[*index].name())
    }

    /// Whether a gesture is currently claimed
    pub fn is_claimed(&self) -> bool {
        self.active.is_some()
    }

    /// Offer a new gesture to the contexts; returns whether one claimed it
    ///
    /// Ignored while another gesture is claimed.
    pub fn pointer_down(&mut self, screen: Vec2, view: &SceneView<'_>) -> bool {
        if let Some(owner) = self.active_context() {
            log::warn!("pointer down ignored: gesture already claimed by '{}'", owner);
            return false;
        }

        for (index, context) in self.contexts.iter_mut().enumerate() {
            if context.pointer_down(screen, view) {
                self.active = Some((index, Gesture::begin(screen, self.drag_threshold)));
                return true;
            }
        }
        log::trace!("pointer down at ({}, {}) unclaimed", screen.x, screen.y);
        false
    }

    /// Track movement; drags are forwarded once past the threshold
    pub fn pointer_move(&mut self, screen: Vec2, view: &SceneView<'_>) {
        let Some((index, gesture)) = self.active.as_mut() else {
            return;
        };
        if let Some(delta) = gesture.update(screen) {
            self.contexts[*index].pointer_drag(screen, delta, view);
        }
    }

    /// End the gesture
    ///
    /// Returns `Some(was_drag)` when a claimed gesture ended, `None` when
    /// there was nothing to end.
    pub fn pointer_up(&mut self, screen: Vec2, view: &SceneView<'_>) -> Option<bool> {
        let (index, mut gesture) = self.active.take()?;
        let context = &mut self.contexts[index];
        if let Some(delta) = gesture.update(screen) {
            context.pointer_drag(screen, delta, view);
        }
        let was_drag = gesture.is_drag();
        context.pointer_up(screen, was_drag, view);
        Some(was_drag)
    }

    /// Dispatch a raw event; returns whether a claimed gesture consumed it
    pub fn dispatch(&mut self, event: PointerEvent, view: &SceneView<'_>) -> bool {
        match event {
            PointerEvent::Down(screen) => self.pointer_down(screen, view),
            PointerEvent::Move(screen) => {
                let claimed = self.is_claimed();
                self.pointer_move(screen, view);
                claimed
            }
            PointerEvent::Up(screen) => self.pointer_up(screen, view).is_some(),
        }
    }
}

impl std::fmt::Debug for ContextStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStack")
            .field("contexts", &self.names())
            .field("active", &self.active)
            .field("drag_threshold", &self.drag_threshold)
            .finish()
    }
}
