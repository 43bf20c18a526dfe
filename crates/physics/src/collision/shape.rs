//! Query shapes and hit results.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::flags::ContentFlags;

/// Identifier of a collider inside a physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// A capsule in world space.
///
/// Defined the way character controllers describe themselves: the centers
/// of the bottom and top hemispheres plus a radius. A capsule whose two
/// centers coincide is a sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    /// Center of the bottom hemisphere.
    pub bottom: Vec3,
    /// Center of the top hemisphere.
    pub top: Vec3,
    /// Radius of the cylinder and both caps.
    pub radius: f32,
}

impl Capsule {
    /// Create a capsule from its hemisphere centers.
    pub fn new(bottom: Vec3, top: Vec3, radius: f32) -> Self {
        Self { bottom, top, radius }
    }

    /// Create an upright capsule standing on `feet`.
    ///
    /// `height` is the total height from the bottom of the lower cap to the
    /// top of the upper cap. Heights below `2 * radius` collapse to a sphere.
    pub fn upright(feet: Vec3, up: Vec3, height: f32, radius: f32) -> Self {
        let top_offset = (height - radius).max(radius);
        Self {
            bottom: feet + up * radius,
            top: feet + up * top_offset,
            radius,
        }
    }

    /// The same capsule moved by `offset`.
    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            bottom: self.bottom + offset,
            top: self.top + offset,
            radius: self.radius,
        }
    }

    /// Midpoint between the two hemisphere centers.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.bottom + self.top) * 0.5
    }

    /// Total height including both caps.
    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom.distance(self.top) + self.radius * 2.0
    }
}

/// Result of a shape cast or raycast that hit something.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeHit {
    /// Distance travelled along the query direction before impact.
    pub distance: f32,
    /// World-space contact point.
    pub point: Vec3,
    /// Surface normal of the obstacle, pointing away from it.
    pub normal: Vec3,
    /// The collider that was hit.
    pub collider: ColliderId,
    /// Content flags of the collider that was hit.
    pub contents: ContentFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upright_capsule() {
        let capsule = Capsule::upright(Vec3::ZERO, Vec3::Y, 1.8, 0.35);
        assert_eq!(capsule.bottom, Vec3::new(0.0, 0.35, 0.0));
        assert!((capsule.top.y - 1.45).abs() < 1e-6);
        assert!((capsule.height() - 1.8).abs() < 1e-5);
    }

    #[test]
    fn test_short_capsule_collapses_to_sphere() {
        let capsule = Capsule::upright(Vec3::ZERO, Vec3::Y, 0.5, 0.35);
        assert_eq!(capsule.bottom, capsule.top);
    }

    #[test]
    fn test_translated() {
        let capsule = Capsule::upright(Vec3::ZERO, Vec3::Y, 1.8, 0.35);
        let moved = capsule.translated(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(moved.bottom - capsule.bottom, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(moved.radius, capsule.radius);
    }
}
