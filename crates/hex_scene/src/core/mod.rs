//! # Core Module
//!
//! Shared configuration for every scene subsystem.
//!
//! ## Organization
//!
//! - **Config**: Scene-wide configuration (hex layout, stacking, interaction, viewport)

pub mod config;

// Re-export commonly used config types
pub use config::{
    SceneConfig,
    HexLayoutConfig,
    StackingConfig,
    InteractionConfig,
    ViewportConfig,
    Config,
    ConfigError,
};
