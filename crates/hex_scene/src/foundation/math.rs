//! Math utilities and types
//!
//! Provides the planar vector type used by the scene.

pub use nalgebra::Vector2;

/// 2D vector type (planar scene coordinates and screen coordinates)
pub type Vec2 = Vector2<f32>;

/// Math constants
pub mod constants {
    /// Square root of three, used by hex layouts
    pub const SQRT_3: f32 = 1.732_050_8;
}

/// Math utility functions
pub mod utils {
    use super::Vec2;

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Midpoint between two planar points
    pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
        Vec2::new(lerp(a.x, b.x, 0.5), lerp(a.y, b.y, 0.5))
    }
}
