//! # Scene Configuration
//!
//! Consolidates the tunables of every scene subsystem into one serializable
//! structure that can be loaded from TOML or RON.
//!
//! ## Configuration Categories
//!
//! - **Layout**: hex size, orientation and planar origin
//! - **Stacking**: how depth keys map onto engine z values
//! - **Interaction**: drag threshold for click/drag discrimination
//! - **Viewport**: screen ↔ planar mapping used by the headless backend

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec2;
use crate::hex::{HexLayout, HexOrientation};

/// # Hex Layout Configuration
///
/// One layout applies to the whole scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HexLayoutConfig {
    /// Distance from a hex center to any corner, in planar units
    pub size: f32,
    /// Pointy-top or flat-top
    pub orientation: HexOrientation,
    /// Planar position of hex (0, 0)
    pub origin: [f32; 2],
}

impl HexLayoutConfig {
    /// Build the runtime layout
    pub fn layout(&self) -> HexLayout {
        HexLayout::new(self.orientation, self.size, Vec2::new(self.origin[0], self.origin[1]))
    }
}

impl Default for HexLayoutConfig {
    fn default() -> Self {
        Self {
            size: 32.0,
            orientation: HexOrientation::Pointy,
            origin: [0.0, 0.0],
        }
    }
}

/// # Stacking Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingConfig {
    /// Engine z distance between two explicit z-index layers
    pub layer_spacing: f32,
    /// Engine z distance between two consecutive arrivals within a layer
    pub ordinal_step: f32,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            layer_spacing: 100.0,
            ordinal_step: 0.001,
        }
    }
}

/// # Interaction Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Cumulative pointer travel (screen pixels) above which a gesture is a drag
    pub drag_threshold: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self { drag_threshold: 5.0 }
    }
}

/// # Viewport Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Planar units per screen pixel
    pub zoom: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            zoom: 1.0,
        }
    }
}

/// # Complete Scene Configuration
///
/// Top-level configuration applications should use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Hex layout
    pub layout: HexLayoutConfig,
    /// Depth mapping
    pub stacking: StackingConfig,
    /// Pointer arbitration
    pub interaction: InteractionConfig,
    /// Screen mapping
    pub viewport: ViewportConfig,
}

impl SceneConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.layout.size.is_finite() && self.layout.size > 0.0) {
            return Err(ConfigError::Invalid(format!("hex size must be positive, got {}", self.layout.size)));
        }
        if self.stacking.ordinal_step <= 0.0 || self.stacking.layer_spacing <= 0.0 {
            return Err(ConfigError::Invalid("stacking steps must be positive".to_string()));
        }
        if self.interaction.drag_threshold < 0.0 {
            return Err(ConfigError::Invalid("drag threshold cannot be negative".to_string()));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid("viewport must have a non-zero size".to_string()));
        }
        if self.viewport.zoom <= 0.0 {
            return Err(ConfigError::Invalid("viewport zoom must be positive".to_string()));
        }
        Ok(())
    }
}

impl Config for SceneConfig {}
