//! Domain data flowing into the scene
//!
//! Items are the unit of content, [`DiffEvent`]s carry changes between
//! stages, and a [`CollectionSource`] is the root that announces them.

mod item;
mod callbacks;
mod diff;
mod source;

pub use item::{Item, ItemId, ItemKind, ItemRef, Payload, DecorationSpec};
pub use callbacks::{ItemCallbacks, PointerArgs, PointerCallback};
pub use diff::DiffEvent;
pub use source::{CollectionSource, DataListener, FeedBatch, SourceId};
