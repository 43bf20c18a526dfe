//! The physics query interface consumed by the locomotion core.

use glam::Vec3;

use super::flags::ContentFlags;
use super::shape::{Capsule, ColliderId, ShapeHit};

/// Read-only access to a physics world.
///
/// The locomotion core never owns world geometry. Every tick it borrows an
/// implementation of this trait, asks it questions, and asks it once where
/// the body ends up when moved. [`CollisionWorld`](super::CollisionWorld)
/// implements it on top of parry3d; tests implement it with scripted fakes.
pub trait PhysicsQuery {
    /// Sweep `capsule` along `direction` for at most `max_distance`.
    ///
    /// Returns the first obstruction among colliders matching `mask`.
    fn capsule_cast(
        &self,
        capsule: &Capsule,
        direction: Vec3,
        max_distance: f32,
        mask: ContentFlags,
    ) -> Option<ShapeHit>;

    /// Cast a ray from `origin` along `direction` for at most `max_distance`.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: ContentFlags,
    ) -> Option<ShapeHit>;

    /// All colliders matching `mask` that intersect `capsule`.
    fn overlap_capsule(&self, capsule: &Capsule, mask: ContentFlags) -> Vec<ColliderId>;

    /// Move `capsule` by `displacement`, stopping at or sliding along
    /// obstructions. Returns the displacement actually applied.
    fn move_capsule(&self, capsule: &Capsule, displacement: Vec3, mask: ContentFlags) -> Vec3;
}
