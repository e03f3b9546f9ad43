//! # Hex Scene
//!
//! Incremental scene maintenance for content placed on a hexagonal grid.
//!
//! ## Features
//!
//! - **Diff Pipeline**: collection changes flow through typed stages
//!   (mapping, positioning, z-stacking, decoration) that each process only
//!   what changed
//! - **Backend Agnostic**: every engine call goes through [`render::RenderBackend`];
//!   a headless backend ships for tests and tooling
//! - **Pointer Interaction**: prioritised contexts with single-claim
//!   gestures and click/drag discrimination
//! - **Configurable**: TOML or RON scene configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hex_scene::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = HexScene::new(SceneConfig::default(), HeadlessBackend::default())?;
//!     let board = scene.add_source();
//!
//!     scene.insert(board, Item::new("note-1", ItemKind::Note).at((0, 0)).on_click(|args| {
//!         println!("clicked {}", args.item_id);
//!     }))?;
//!     scene.move_item(board, &"note-1".into(), HexCoord::new(2, -1))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Configuration
pub mod core;
pub mod config;

// Shared utilities
pub mod foundation;

// Scene
pub mod hex;
pub mod data;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod input;

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        core::config::{Config, SceneConfig},
        data::{CollectionSource, DecorationSpec, FeedBatch, Item, ItemId, ItemKind, Payload, PointerArgs, SourceId},
        foundation::math::Vec2,
        hex::{HexCoord, HexLayout, HexOrientation},
        input::{InteractionContext, ItemContext, PointerEvent},
        pipeline::{MappingStage, NodeId},
        render::{HeadlessBackend, RenderBackend, RenderFault},
        scene::{HexScene, InteractionFlags, SceneError, SceneUpdate},
    };
}
