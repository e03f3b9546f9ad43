//! Domain items placed on the hex grid

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::data::{ItemCallbacks, PointerArgs};
use crate::hex::HexCoord;

/// Stable item identity, unchanged across moves
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of content an item represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Hyperlink
    Link,
    /// Text note
    Note,
    /// Image, audio or video
    Media,
    /// 3D model
    Model,
    /// Group of other items
    Container,
    /// Uploaded file
    File,
    /// Free-standing vector drawing
    Vector,
    /// Free-standing badge
    Badge,
    /// Scene backdrop
    Background,
}

impl ItemKind {
    /// Every kind, in declaration order
    pub const ALL: [ItemKind; 9] = [
        ItemKind::Link,
        ItemKind::Note,
        ItemKind::Media,
        ItemKind::Model,
        ItemKind::Container,
        ItemKind::File,
        ItemKind::Vector,
        ItemKind::Badge,
        ItemKind::Background,
    ];
}

/// Kind-specific content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// No content
    #[default]
    Empty,
    /// Hyperlink target
    Link {
        /// Destination URL
        url: String,
        /// Display title
        #[serde(default)]
        title: Option<String>,
    },
    /// Text body
    Note {
        /// Note text
        text: String,
    },
    /// Media reference
    Media {
        /// Media URI
        uri: String,
        /// MIME type when known
        #[serde(default)]
        mime: Option<String>,
    },
    /// Model reference
    Model {
        /// Model URI
        uri: String,
    },
    /// Grouped items
    Container {
        /// Member ids
        children: Vec<ItemId>,
    },
    /// File reference
    File {
        /// File name
        name: String,
        /// Size in bytes
        size_bytes: u64,
    },
    /// Polyline points relative to the item's cell center
    Vector {
        /// Planar points
        points: Vec<[f32; 2]>,
    },
    /// Badge text
    Badge {
        /// Label
        label: String,
    },
    /// Backdrop color
    Background {
        /// RGBA color
        color: [f32; 4],
    },
}

/// Secondary visual attached to an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorationSpec {
    /// Small label pinned to the item's corner
    Badge {
        /// Label text
        label: String,
    },
    /// Line from this item to another; shown only while both are live
    Connector {
        /// Other endpoint
        to: ItemId,
    },
}

/// A domain item
///
/// Attributes only change through remove + re-add of the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Identity
    pub id: ItemId,
    /// Kind, used to select the mapping factory
    pub kind: ItemKind,
    /// Cell the item occupies, if any
    #[serde(default)]
    pub coordinate: Option<HexCoord>,
    /// Explicit stacking layer
    #[serde(default)]
    pub z_index: Option<i32>,
    /// Kind-specific content
    #[serde(default)]
    pub payload: Payload,
    /// Attached decorations
    #[serde(default)]
    pub decorations: Vec<DecorationSpec>,
    /// Pointer handlers
    #[serde(skip)]
    pub callbacks: ItemCallbacks,
}

/// Shared handle to an item
///
/// Sources and stages hold strong references; renderables hold `Weak`.
pub type ItemRef = Rc<Item>;

impl Item {
    /// Create an item with no coordinate, payload or handlers
    pub fn new(id: impl Into<ItemId>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            kind,
            coordinate: None,
            z_index: None,
            payload: Payload::Empty,
            decorations: Vec::new(),
            callbacks: ItemCallbacks::default(),
        }
    }

    /// Place the item at a cell
    pub fn at(mut self, coord: impl Into<HexCoord>) -> Self {
        self.coordinate = Some(coord.into());
        self
    }

    /// Set an explicit stacking layer
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Attach a decoration
    pub fn with_decoration(mut self, decoration: DecorationSpec) -> Self {
        self.decorations.push(decoration);
        self
    }

    /// Set the click handler
    pub fn on_click(mut self, handler: impl Fn(&PointerArgs) + 'static) -> Self {
        self.callbacks.on_click = Some(Rc::new(handler));
        self
    }

    /// Set the drag handler
    pub fn on_drag(mut self, handler: impl Fn(&PointerArgs) + 'static) -> Self {
        self.callbacks.on_drag = Some(Rc::new(handler));
        self
    }

    /// Set the release handler
    pub fn on_release(mut self, handler: impl Fn(&PointerArgs) + 'static) -> Self {
        self.callbacks.on_release = Some(Rc::new(handler));
        self
    }

    /// Copy of this item at another cell (handlers are shared)
    pub fn moved_to(&self, coord: HexCoord) -> Self {
        Self {
            coordinate: Some(coord),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_deserializes_from_ron_without_callbacks() {
        let item: Item = ron::from_str(
            r#"(
                id: "note-1",
                kind: note,
                coordinate: Some((u: 2, v: -1)),
                payload: Note(text: "hello"),
                decorations: [Badge(label: "new"), Connector(to: "link-7")],
            )"#,
        )
        .unwrap();

        assert_eq!(item.id.as_str(), "note-1");
        assert_eq!(item.kind, ItemKind::Note);
        assert_eq!(item.coordinate, Some(HexCoord::new(2, -1)));
        assert_eq!(item.z_index, None);
        assert_eq!(item.decorations.len(), 2);
        assert!(item.callbacks.is_empty());
    }

    #[test]
    fn test_moved_to_keeps_identity_and_handlers() {
        let item = Item::new("a", ItemKind::Link).at((0, 0)).on_click(|_| {});
        let moved = item.moved_to(HexCoord::new(3, 3));

        assert_eq!(moved.id, item.id);
        assert_eq!(moved.coordinate, Some(HexCoord::new(3, 3)));
        assert!(moved.callbacks.on_click.is_some());
    }
}
