//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait rendering backends implement so the
//! pipeline stages and the scene materializer can drive any engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::StackingConfig;
use crate::foundation::math::Vec2;

slotmap::new_key_type! {
    /// Opaque handle to a renderable owned by the backend
    ///
    /// Carries a generation counter so a disposed handle is never confused
    /// with a newer renderable occupying the same slot.
    pub struct RenderHandle;
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Outline used for drawing and hit testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// Hexagonal tile filling a cell
    Hexagon,
    /// Round marker
    Disc,
    /// Open line strip
    Polyline,
    /// Full-scene backdrop
    Backdrop,
}

/// Everything a backend needs to create a renderable
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSpec {
    /// Human-readable label for diagnostics
    pub label: String,
    /// Outline
    pub shape: Shape,
    /// Hit radius on the scene plane (`f32::INFINITY` covers the plane)
    pub radius: f32,
}

impl RenderSpec {
    /// Create a spec
    pub fn new(label: impl Into<String>, shape: Shape, radius: f32) -> Self {
        Self {
            label: label.into(),
            shape,
            radius,
        }
    }
}

/// Stacking key: explicit layer first, then arrival order
///
/// Higher compares nearer to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Depth {
    /// Explicit z-index, or 0
    pub layer: i32,
    /// Monotonic arrival counter
    pub ordinal: u64,
}

impl Depth {
    /// Create a depth key
    pub fn new(layer: i32, ordinal: u64) -> Self {
        Self { layer, ordinal }
    }

    /// Engine z value for this key
    #[allow(clippy::cast_precision_loss)]
    pub fn to_z(self, config: &StackingConfig) -> f32 {
        self.layer as f32 * config.layer_spacing + self.ordinal as f32 * config.ordinal_step
    }
}

/// Rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Handle was disposed or never existed
    #[error("invalid render handle {0:?}")]
    InvalidHandle(RenderHandle),

    /// Backend could not create the renderable
    #[error("failed to create renderable '{label}': {reason}")]
    CreationFailed {
        /// Spec label
        label: String,
        /// Backend explanation
        reason: String,
    },

    /// Backend refused to release a resource
    #[error("backend refused to dispose {0:?}")]
    DisposalRefused(RenderHandle),
}

/// Backend operation that can fail without rejecting a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOp {
    /// Creating a decoration
    Create,
    /// Moving a renderable
    SetPosition,
    /// Stacking a renderable
    SetDepth,
    /// Inserting into the scene graph
    Attach,
    /// Releasing a renderable
    Dispose,
}

/// Recoverable failure for a single renderable
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFault {
    /// Node the operation targeted
    pub target: String,
    /// Operation that failed
    pub op: RenderOp,
    /// Backend error
    pub error: RenderError,
}

impl RenderFault {
    /// Create a fault
    pub fn new(target: impl fmt::Display, op: RenderOp, error: RenderError) -> Self {
        Self {
            target: target.to_string(),
            op,
            error,
        }
    }
}

impl fmt::Display for RenderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} on {} failed: {}", self.op, self.target, self.error)
    }
}

/// Main rendering backend trait
///
/// All calls happen on the scene's update thread.
pub trait RenderBackend {
    /// Create a renderable, detached from the scene graph
    fn create_renderable(&mut self, spec: &RenderSpec) -> BackendResult<RenderHandle>;

    /// Move a renderable on the scene plane
    fn set_position(&mut self, handle: RenderHandle, position: Vec2) -> BackendResult<()>;

    /// Stack a renderable
    fn set_depth(&mut self, handle: RenderHandle, depth: Depth) -> BackendResult<()>;

    /// Insert a renderable into the scene graph
    fn attach(&mut self, handle: RenderHandle) -> BackendResult<()>;

    /// Remove a renderable from the scene graph and release it
    fn dispose(&mut self, handle: RenderHandle) -> BackendResult<()>;

    /// Topmost attached renderable under a screen point accepted by `predicate`
    fn hit_test(&self, screen: Vec2, predicate: &dyn Fn(RenderHandle) -> bool) -> Option<RenderHandle>;

    /// Map a screen point onto the scene plane
    fn unproject(&self, screen: Vec2) -> Vec2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_orders_layer_before_ordinal() {
        assert!(Depth::new(1, 0) > Depth::new(0, 999));
        assert!(Depth::new(0, 2) > Depth::new(0, 1));
        assert!(Depth::new(-1, 50) < Depth::new(0, 0));
    }

    #[test]
    fn test_depth_to_z() {
        let config = StackingConfig {
            layer_spacing: 10.0,
            ordinal_step: 0.5,
        };
        assert_eq!(Depth::new(2, 3).to_z(&config), 21.5);
    }
}
