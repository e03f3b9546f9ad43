//! Pointer interaction
//!
//! ## Architecture
//!
//! ```text
//! screen event
//!      ↓
//! ContextStack (priority order, one claimed gesture at a time)
//!      ↓
//! InteractionContext (hit test over its flag mask → Claim)
//!      ↓
//! item callback (on_click / on_drag / on_release)
//! ```
//!
//! Contexts hold only the transient claim between pointer-down and
//! pointer-up; the dispatcher decides click versus drag from the gesture's
//! cumulative path length.

mod gesture;
mod context;
mod dispatcher;

pub use gesture::Gesture;
pub use context::{BackgroundContext, Claim, ContextState, InteractionContext, ItemContext};
pub use dispatcher::ContextStack;

use crate::foundation::math::Vec2;

/// Raw pointer input in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed
    Down(Vec2),
    /// Pointer moved
    Move(Vec2),
    /// Button released
    Up(Vec2),
}

impl PointerEvent {
    /// Screen position of the event
    pub fn position(&self) -> Vec2 {
        match *self {
            PointerEvent::Down(p) | PointerEvent::Move(p) | PointerEvent::Up(p) => p,
        }
    }
}
