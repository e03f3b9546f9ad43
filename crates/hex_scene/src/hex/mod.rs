//! Hex grid geometry
//!
//! Axial coordinates, planar projection and distances. Everything here is
//! pure and total over `i32` inputs.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants::SQRT_3, Vec2};

/// Axial hex coordinate `(u, v)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HexCoord {
    /// Axial column
    pub u: i32,
    /// Axial row
    pub v: i32,
}

/// Axial offsets of the six neighbours, counter-clockwise from east
const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

impl HexCoord {
    /// Create a coordinate
    pub const fn new(u: i32, v: i32) -> Self {
        Self { u, v }
    }

    /// Distance in hex steps to `other`
    pub fn distance(self, other: Self) -> u64 {
        hex_distance(self, other)
    }

    /// The six adjacent cells
    pub fn neighbors(self) -> [HexCoord; 6] {
        NEIGHBOR_OFFSETS.map(|(du, dv)| HexCoord::new(self.u.wrapping_add(du), self.v.wrapping_add(dv)))
    }
}

impl From<(i32, i32)> for HexCoord {
    fn from((u, v): (i32, i32)) -> Self {
        Self::new(u, v)
    }
}

/// Hex distance `(|u1-u2| + |u1+v1-u2-v2| + |v1-v2|) / 2`
///
/// Computed in `i64` so extreme `i32` inputs cannot overflow.
pub fn hex_distance(a: HexCoord, b: HexCoord) -> u64 {
    let du = i64::from(a.u) - i64::from(b.u);
    let dv = i64::from(a.v) - i64::from(b.v);
    (du.unsigned_abs() + (du + dv).unsigned_abs() + dv.unsigned_abs()) / 2
}

/// Cell orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HexOrientation {
    /// A corner points up; rows are horizontal
    #[default]
    Pointy,
    /// An edge is on top; columns are vertical
    Flat,
}

/// Fixed hex layout shared by the whole scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexLayout {
    orientation: HexOrientation,
    size: f32,
    origin: Vec2,
}

impl HexLayout {
    /// Create a layout; `size` is the center-to-corner distance
    pub fn new(orientation: HexOrientation, size: f32, origin: Vec2) -> Self {
        Self { orientation, size, origin }
    }

    /// Orientation of the cells
    pub fn orientation(&self) -> HexOrientation {
        self.orientation
    }

    /// Center-to-corner distance
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Planar center of a cell
    #[allow(clippy::cast_precision_loss)]
    pub fn to_pixel(&self, coord: HexCoord) -> Vec2 {
        let u = coord.u as f32;
        let v = coord.v as f32;
        let (x, y) = match self.orientation {
            HexOrientation::Pointy => (SQRT_3 * u + SQRT_3 / 2.0 * v, 1.5 * v),
            HexOrientation::Flat => (1.5 * u, SQRT_3 / 2.0 * u + SQRT_3 * v),
        };
        self.origin + Vec2::new(x, y) * self.size
    }

    /// Cell containing a planar point
    pub fn from_pixel(&self, point: Vec2) -> HexCoord {
        let p = (point - self.origin) / self.size;
        let (u, v) = match self.orientation {
            HexOrientation::Pointy => (SQRT_3 / 3.0 * p.x - p.y / 3.0, 2.0 / 3.0 * p.y),
            HexOrientation::Flat => (2.0 / 3.0 * p.x, -p.x / 3.0 + SQRT_3 / 3.0 * p.y),
        };
        round_axial(u, v)
    }
}

impl Default for HexLayout {
    fn default() -> Self {
        Self::new(HexOrientation::Pointy, 32.0, Vec2::zeros())
    }
}

/// Round fractional axial coordinates to the nearest cell via cube rounding
#[allow(clippy::cast_possible_truncation)]
fn round_axial(u: f32, v: f32) -> HexCoord {
    let w = -u - v;
    let mut ru = u.round();
    let mut rv = v.round();
    let rw = w.round();

    let du = (ru - u).abs();
    let dv = (rv - v).abs();
    let dw = (rw - w).abs();

    if du > dv && du > dw {
        ru = -rv - rw;
    } else if dv > dw {
        rv = -ru - rw;
    }
    HexCoord::new(ru as i32, rv as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_matches_axial_formula() {
        let origin = HexCoord::new(0, 0);
        assert_eq!(hex_distance(origin, origin), 0);
        assert_eq!(hex_distance(origin, HexCoord::new(1, 0)), 1);
        assert_eq!(hex_distance(origin, HexCoord::new(1, -1)), 1);
        assert_eq!(hex_distance(origin, HexCoord::new(2, 1)), 3);
        assert_eq!(hex_distance(HexCoord::new(-3, 2), HexCoord::new(1, -1)), 4);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = HexCoord::new(5, -7);
        let b = HexCoord::new(-2, 3);
        assert_eq!(a.distance(b), b.distance(a));
    }

    #[test]
    fn test_distance_total_at_i32_extremes() {
        let a = HexCoord::new(i32::MIN, i32::MIN);
        let b = HexCoord::new(i32::MAX, i32::MAX);
        // du = dv = 2^32 - 1, du + dv = 2^33 - 2
        assert_eq!(hex_distance(a, b), (1u64 << 33) - 2);
    }

    #[test]
    fn test_neighbors_are_distance_one() {
        let center = HexCoord::new(3, -1);
        for neighbor in center.neighbors() {
            assert_eq!(center.distance(neighbor), 1);
        }
    }

    #[test]
    fn test_pointy_to_pixel() {
        let layout = HexLayout::new(HexOrientation::Pointy, 10.0, Vec2::zeros());
        let p = layout.to_pixel(HexCoord::new(1, 0));
        assert_relative_eq!(p.x, 10.0 * SQRT_3, epsilon = 1e-4);
        assert_relative_eq!(p.y, 0.0);

        let p = layout.to_pixel(HexCoord::new(0, 1));
        assert_relative_eq!(p.x, 5.0 * SQRT_3, epsilon = 1e-4);
        assert_relative_eq!(p.y, 15.0, epsilon = 1e-4);
    }

    #[test]
    fn test_flat_to_pixel_with_origin() {
        let layout = HexLayout::new(HexOrientation::Flat, 2.0, Vec2::new(100.0, 50.0));
        let p = layout.to_pixel(HexCoord::new(2, 0));
        assert_relative_eq!(p.x, 106.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 50.0 + 2.0 * SQRT_3, epsilon = 1e-4);
    }

    #[test]
    fn test_from_pixel_inverts_to_pixel() {
        for orientation in [HexOrientation::Pointy, HexOrientation::Flat] {
            let layout = HexLayout::new(orientation, 24.0, Vec2::new(-7.0, 3.0));
            for u in -4..=4 {
                for v in -4..=4 {
                    let coord = HexCoord::new(u, v);
                    assert_eq!(layout.from_pixel(layout.to_pixel(coord)), coord);
                }
            }
        }
    }

    #[test]
    fn test_from_pixel_snaps_nearby_points() {
        let layout = HexLayout::default();
        let center = layout.to_pixel(HexCoord::new(2, -1));
        assert_eq!(layout.from_pixel(center + Vec2::new(4.0, -3.0)), HexCoord::new(2, -1));
    }
}
