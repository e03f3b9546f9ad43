//! Backend-facing API types

mod render_backend;

pub use render_backend::{
    BackendResult, Depth, RenderBackend, RenderError, RenderFault, RenderHandle, RenderOp, RenderSpec, Shape,
};
