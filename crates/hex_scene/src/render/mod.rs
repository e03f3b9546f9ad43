//! # Rendering Capability Surface
//!
//! The pipeline never talks to a graphics API directly. It depends on the
//! narrow [`RenderBackend`] trait: create, position, stack, attach and
//! dispose a renderable, hit-test a screen point, and map screen points to
//! the scene plane.
//!
//! ## Backends
//!
//! - **Headless**: in-memory engine used by tests and the demo app

pub mod api;
pub mod headless;

pub use api::{
    BackendResult, Depth, RenderBackend, RenderError, RenderFault, RenderHandle, RenderOp, RenderSpec, Shape,
};
pub use headless::{HeadlessBackend, HeadlessObject, BackendStats};
