//! Scene management
//!
//! Bridges the pipeline (data) with the render backend (graphics) and the
//! pointer dispatcher (input).
//!
//! ## Architecture
//!
//! ```text
//! CollectionSource(s)
//!      ↓
//! Pipeline (mapping → positioning → z-stacking → decoration)
//!      ↓
//! SceneMaterializer (live set, attach / dispose)
//!      ↑
//! ContextStack (hit tests through SceneView)
//! ```
//!
//! [`HexScene`] owns all of it and is the single entry point on the update
//! thread.

mod renderable;
mod materializer;
mod hex_scene;

pub use renderable::{InteractionFlags, Renderable};
pub use materializer::{RenderableKey, SceneMaterializer, SceneView};
pub use hex_scene::{HexScene, SceneError, SceneUpdate};
