//! Horizontal-plane containment.
//!
//! Zones are infinite-height prisms: only the `x` and `z` axes of a position are tested,
//! `y` (height) is ignored.

use serde::{Deserialize, Serialize};

/// A world position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A point on the ground plane spanned by the x and z axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanePoint {
    pub x: f64,
    pub z: f64,
}

impl PlanePoint {
    #[must_use]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

/// Anything that can be projected onto the ground plane.
pub trait Planar {
    fn plane(&self) -> PlanePoint;
}

impl Planar for PlanePoint {
    #[inline]
    fn plane(&self) -> PlanePoint {
        *self
    }
}

impl Planar for Position {
    #[inline]
    fn plane(&self) -> PlanePoint {
        PlanePoint::new(self.x, self.z)
    }
}

/// Even-odd ray cast along +x from `point` against the closed ring `ring`.
///
/// Edges are consecutive vertex pairs plus the wrap-around edge from the last vertex to
/// the first. Rings with fewer than 3 vertices never contain anything. Points exactly on
/// an edge are classified consistently but without a guarantee of inside or outside.
#[must_use]
pub fn point_in_polygon<P: Planar>(point: PlanePoint, ring: &[P]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut crossings = 0u32;
    for i in 0..n {
        let a = ring[i].plane();
        let b = ring[(i + 1) % n].plane();

        let a_above = a.z > point.z;
        let b_above = b.z > point.z;
        if a_above == b_above {
            continue;
        }

        let dz = b.z - a.z;
        if dz == 0.0 {
            continue;
        }
        let intersect_x = a.x + (point.z - a.z) * (b.x - a.x) / dz;
        if point.x < intersect_x {
            crossings += 1;
        }
    }

    crossings % 2 == 1
}
