//! Collision world containing static geometry.
//!
//! The collision world stores collidable geometry and answers the
//! [`PhysicsQuery`] questions the locomotion core asks every tick. Narrow
//! phase work is delegated to parry3d; there is no broad phase, which is
//! fine for hand-built test courses with a few dozen colliders.

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::na::{Quaternion, Translation3, UnitQuaternion};
use parry3d::query::{self, Ray, RayCast, ShapeCastOptions};
use parry3d::shape::{self as pshape, SharedShape};
use thiserror::Error;

use super::flags::ContentFlags;
use super::query::PhysicsQuery;
use super::shape::{Capsule, ColliderId, ShapeHit};

/// Maximum number of sweep/clip iterations for a single move.
const MAX_SLIDE_ITERATIONS: usize = 5;

/// Moves shorter than this are dropped.
const MIN_MOVE_DISTANCE: f32 = 1.0e-5;

/// Tolerance when testing whether a clipped motion still enters a plane.
const PLANE_EPSILON: f32 = 1.0e-4;

/// Default gap kept between a moved capsule and the surfaces it touches.
pub const DEFAULT_CONTACT_OFFSET: f32 = 0.01;

/// Errors raised while building world geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("convex hull needs at least four non-coplanar points, got {0}")]
    DegenerateHull(usize),

    #[error("invalid triangle mesh: {0}")]
    InvalidMesh(String),
}

/// A piece of collision geometry in the world.
#[derive(Clone)]
struct Collider {
    id: ColliderId,
    shape: SharedShape,
    transform: Isometry<Real>,
    contents: ContentFlags,
}

/// The collision world containing all static geometry.
///
/// Supports axis-aligned and oriented boxes, convex hulls and triangle
/// meshes. Geometry is immutable while queried, so a world can be shared by
/// every character ticking in a frame.
#[derive(Clone)]
pub struct CollisionWorld {
    colliders: Vec<Collider>,
    next_id: u32,
    contact_offset: f32,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CollisionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionWorld")
            .field("colliders", &self.colliders.len())
            .field("contact_offset", &self.contact_offset)
            .finish()
    }
}

impl CollisionWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self {
            colliders: Vec::new(),
            next_id: 0,
            contact_offset: DEFAULT_CONTACT_OFFSET,
        }
    }

    /// Use a different gap between moved capsules and surfaces.
    pub fn with_contact_offset(mut self, contact_offset: f32) -> Self {
        self.contact_offset = contact_offset.max(0.0);
        self
    }

    /// Gap kept between a moved capsule and the surfaces it touches.
    pub fn contact_offset(&self) -> f32 {
        self.contact_offset
    }

    /// Add an axis-aligned box.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position of the box in world space
    /// * `half_extents` - Half-size in each axis (x, y, z)
    /// * `contents` - Content flags for collision filtering
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, contents: ContentFlags) -> ColliderId {
        self.add_oriented_box(center, half_extents, Quat::IDENTITY, contents)
    }

    /// Add a rotated box. Ramps are built this way.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        contents: ContentFlags,
    ) -> ColliderId {
        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        self.insert(shape, isometry(center, rotation), contents)
    }

    /// Add a convex hull built from `points`.
    pub fn add_convex_hull(
        &mut self,
        points: &[Vec3],
        contents: ContentFlags,
    ) -> Result<ColliderId, GeometryError> {
        // A solid hull needs at least a tetrahedron
        if points.len() < 4 {
            return Err(GeometryError::DegenerateHull(points.len()));
        }
        let parry_points: Vec<Point<Real>> = points.iter().map(|p| to_point(*p)).collect();
        let shape = SharedShape::convex_hull(&parry_points)
            .ok_or(GeometryError::DegenerateHull(points.len()))?;
        Ok(self.insert(shape, Isometry::identity(), contents))
    }

    /// Add a triangle mesh.
    ///
    /// # Arguments
    ///
    /// * `vertices` - Mesh vertex positions
    /// * `indices` - Triangle indices (3 per triangle)
    /// * `contents` - Content flags for collision filtering
    pub fn add_triangle_mesh(
        &mut self,
        vertices: &[Vec3],
        indices: &[[u32; 3]],
        contents: ContentFlags,
    ) -> Result<ColliderId, GeometryError> {
        let parry_vertices: Vec<Point<Real>> = vertices.iter().map(|v| to_point(*v)).collect();
        let shape = SharedShape::trimesh(parry_vertices, indices.to_vec())
            .map_err(|e| GeometryError::InvalidMesh(format!("{e:?}")))?;
        Ok(self.insert(shape, Isometry::identity(), contents))
    }

    /// Remove a collider. Returns `false` if it was not present.
    pub fn remove(&mut self, id: ColliderId) -> bool {
        let before = self.colliders.len();
        self.colliders.retain(|c| c.id != id);
        self.colliders.len() != before
    }

    /// Remove all collision geometry.
    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    /// Get the number of colliders.
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    fn insert(&mut self, shape: SharedShape, transform: Isometry<Real>, contents: ContentFlags) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id += 1;
        self.colliders.push(Collider {
            id,
            shape,
            transform,
            contents,
        });
        id
    }

    fn matching(&self, mask: ContentFlags) -> impl Iterator<Item = &Collider> {
        self.colliders.iter().filter(move |c| mask.intersects(c.contents))
    }
}

impl PhysicsQuery for CollisionWorld {
    fn capsule_cast(
        &self,
        capsule: &Capsule,
        direction: Vec3,
        max_distance: f32,
        mask: ContentFlags,
    ) -> Option<ShapeHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        let (shape, pose) = parry_capsule(capsule);
        let velocity = to_vector(direction);
        let mut options = ShapeCastOptions::with_max_time_of_impact(max_distance);
        // Shapes we already touch only count if we keep pushing into them.
        options.stop_at_penetration = false;

        let mut best: Option<ShapeHit> = None;
        for collider in self.matching(mask) {
            let Ok(Some(hit)) = query::cast_shapes(
                &pose,
                &velocity,
                &shape,
                &collider.transform,
                &Vector::zeros(),
                collider.shape.as_ref(),
                options,
            ) else {
                continue;
            };

            if best.as_ref().is_some_and(|b| b.distance <= hit.time_of_impact) {
                continue;
            }

            let mut normal = from_vector(collider.transform.rotation * hit.normal2.into_inner());
            if normal.dot(direction) > 0.0 {
                normal = -normal;
            }
            best = Some(ShapeHit {
                distance: hit.time_of_impact,
                point: from_point(collider.transform * hit.witness2),
                normal: normal.normalize_or(-direction),
                collider: collider.id,
                contents: collider.contents,
            });
        }
        best
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: ContentFlags,
    ) -> Option<ShapeHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        let ray = Ray::new(to_point(origin), to_vector(direction));

        let mut best: Option<ShapeHit> = None;
        for collider in self.matching(mask) {
            let Some(hit) =
                collider
                    .shape
                    .cast_ray_and_get_normal(&collider.transform, &ray, max_distance, true)
            else {
                continue;
            };

            if best.as_ref().is_some_and(|b| b.distance <= hit.time_of_impact) {
                continue;
            }

            best = Some(ShapeHit {
                distance: hit.time_of_impact,
                point: origin + direction * hit.time_of_impact,
                normal: from_vector(hit.normal).normalize_or(-direction),
                collider: collider.id,
                contents: collider.contents,
            });
        }
        best
    }

    fn overlap_capsule(&self, capsule: &Capsule, mask: ContentFlags) -> Vec<ColliderId> {
        let (shape, pose) = parry_capsule(capsule);
        self.matching(mask)
            .filter(|collider| {
                matches!(
                    query::intersection_test(&pose, &shape, &collider.transform, collider.shape.as_ref()),
                    Ok(true)
                )
            })
            .map(|collider| collider.id)
            .collect()
    }

    fn move_capsule(&self, capsule: &Capsule, displacement: Vec3, mask: ContentFlags) -> Vec3 {
        let mut applied = Vec3::ZERO;
        let mut remaining = displacement;
        let mut planes: Vec<Vec3> = Vec::with_capacity(MAX_SLIDE_ITERATIONS);

        for _ in 0..MAX_SLIDE_ITERATIONS {
            let distance = remaining.length();
            if distance < MIN_MOVE_DISTANCE {
                break;
            }
            let direction = remaining / distance;

            let swept = capsule.translated(applied);
            let Some(hit) =
                self.capsule_cast(&swept, direction, distance + self.contact_offset, mask)
            else {
                applied += remaining;
                break;
            };

            // Stop short of the surface, then slide whatever is left along it.
            let travel = (hit.distance - self.contact_offset).clamp(0.0, distance);
            applied += direction * travel;
            planes.push(hit.normal);
            remaining = clip_against_planes(direction * (distance - travel), &planes);
        }

        applied
    }
}

/// Remove the into-surface components of `motion` for every touched plane.
///
/// When two planes form a crease the motion is restricted to the crease
/// line; if even that enters a plane the motion is cancelled.
fn clip_against_planes(motion: Vec3, planes: &[Vec3]) -> Vec3 {
    let mut clipped = motion;
    for normal in planes {
        let into = clipped.dot(*normal);
        if into < 0.0 {
            clipped -= *normal * into;
        }
    }

    let enters = |v: Vec3| planes.iter().any(|n| v.dot(*n) < -PLANE_EPSILON);
    if !enters(clipped) {
        return clipped;
    }

    if let [.., first, second] = planes {
        let crease = first.cross(*second).normalize_or_zero();
        let along = crease * motion.dot(crease);
        if !enters(along) {
            return along;
        }
    }

    Vec3::ZERO
}

fn parry_capsule(capsule: &Capsule) -> (pshape::Capsule, Isometry<Real>) {
    let center = capsule.center();
    let shape = pshape::Capsule::new(
        to_point(capsule.bottom - center),
        to_point(capsule.top - center),
        capsule.radius,
    );
    (shape, isometry(center, Quat::IDENTITY))
}

fn isometry(translation: Vec3, rotation: Quat) -> Isometry<Real> {
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry::from_parts(Translation3::new(translation.x, translation.y, translation.z), rotation)
}

#[inline]
fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

#[inline]
fn from_point(p: Point<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

#[inline]
fn from_vector(v: Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS: f32 = 0.35;
    const HEIGHT: f32 = 1.8;

    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();

        // Floor with its top face at y=0
        world.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(50.0, 0.5, 50.0),
            ContentFlags::SOLID,
        );

        // Wall whose near face is at x=9.5
        world.add_box(
            Vec3::new(10.0, 2.5, 0.0),
            Vec3::new(0.5, 2.5, 10.0),
            ContentFlags::SOLID,
        );

        world
    }

    fn body_at(feet: Vec3) -> Capsule {
        Capsule::upright(feet, Vec3::Y, HEIGHT, RADIUS)
    }

    #[test]
    fn test_raycast_hit() {
        let world = create_test_world();

        let hit = world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 100.0, ContentFlags::SOLID)
            .expect("wall should be hit");

        assert!((hit.distance - 9.5).abs() < 0.01);
        assert!((hit.normal - Vec3::NEG_X).length() < 0.01);
    }

    #[test]
    fn test_raycast_miss() {
        let world = create_test_world();

        let hit = world.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_X, 100.0, ContentFlags::SOLID);
        assert!(hit.is_none());
    }

    #[test]
    fn test_raycast_respects_max_distance() {
        let world = create_test_world();

        let hit = world.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 5.0, ContentFlags::SOLID);
        assert!(hit.is_none());
    }

    #[test]
    fn test_capsule_cast_down_finds_floor() {
        let world = create_test_world();

        let hit = world
            .capsule_cast(&body_at(Vec3::new(0.0, 1.0, 0.0)), Vec3::NEG_Y, 5.0, ContentFlags::SOLID)
            .expect("floor should be hit");

        assert!((hit.distance - 1.0).abs() < 0.01, "distance={}", hit.distance);
        assert!(hit.normal.y > 0.99);
    }

    #[test]
    fn test_capsule_cast_ignores_surfaces_we_move_away_from() {
        let world = create_test_world();

        // Resting right on the floor and moving up
        let hit = world.capsule_cast(&body_at(Vec3::ZERO), Vec3::Y, 1.0, ContentFlags::SOLID);
        assert!(hit.is_none());
    }

    #[test]
    fn test_overlap_finds_low_ceiling() {
        let mut world = create_test_world();
        let ceiling = world.add_box(
            Vec3::new(0.0, 1.5, 0.0),
            Vec3::new(2.0, 0.25, 2.0),
            ContentFlags::SOLID,
        );

        let standing = body_at(Vec3::new(0.0, 0.01, 0.0));
        assert_eq!(world.overlap_capsule(&standing, ContentFlags::MASK_PLAYER_SOLID), vec![ceiling]);

        let crouched = Capsule::upright(Vec3::new(0.0, 0.01, 0.0), Vec3::Y, 0.9, RADIUS);
        assert!(world.overlap_capsule(&crouched, ContentFlags::MASK_PLAYER_SOLID).is_empty());
    }

    #[test]
    fn test_move_capsule_free() {
        let world = CollisionWorld::new();

        let applied = world.move_capsule(
            &body_at(Vec3::ZERO),
            Vec3::new(5.0, 0.0, 0.0),
            ContentFlags::SOLID,
        );
        assert_eq!(applied, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_move_capsule_lands_with_contact_offset() {
        let world = create_test_world();

        let applied = world.move_capsule(
            &body_at(Vec3::new(0.0, 2.0, 0.0)),
            Vec3::new(0.0, -5.0, 0.0),
            ContentFlags::SOLID,
        );
        let feet = 2.0 + applied.y;
        assert!((feet - DEFAULT_CONTACT_OFFSET).abs() < 0.005, "feet={feet}");
    }

    #[test]
    fn test_move_capsule_slides_along_wall() {
        let world = create_test_world();

        let start = Vec3::new(8.0, 0.05, 0.0);
        let applied = world.move_capsule(
            &body_at(start),
            Vec3::new(4.0, 0.0, 2.0),
            ContentFlags::SOLID,
        );
        let end = start + applied;

        // Stopped by the wall face at x=9.5 minus the radius...
        assert!(end.x < 9.5 - RADIUS + 0.001, "x={}", end.x);
        // ...but kept sliding along it.
        assert!(end.z > 1.9, "z={}", end.z);
    }

    #[test]
    fn test_content_mask_filtering() {
        let mut world = CollisionWorld::new();

        world.add_box(Vec3::new(5.0, 1.0, 0.0), Vec3::new(0.5, 1.0, 5.0), ContentFlags::SOLID);
        world.add_box(Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.5, 1.0, 5.0), ContentFlags::TRIGGER);

        // Player mask ignores the trigger
        let hit = world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 100.0, ContentFlags::MASK_PLAYER_SOLID)
            .expect("solid wall should be hit");
        assert!((hit.distance - 4.5).abs() < 0.01);
        assert_eq!(hit.contents, ContentFlags::SOLID);
    }

    #[test]
    fn test_oriented_box_normal() {
        let mut world = CollisionWorld::new();
        let tilt = 30.0_f32.to_radians();
        world.add_oriented_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(10.0, 0.5, 10.0),
            Quat::from_rotation_x(tilt),
            ContentFlags::SOLID,
        );

        let hit = world
            .raycast(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 20.0, ContentFlags::SOLID)
            .expect("ramp should be hit");
        let angle = hit.normal.angle_between(Vec3::Y).to_degrees();
        assert!((angle - 30.0).abs() < 0.1, "angle={angle}");
    }

    #[test]
    fn test_degenerate_hull_is_an_error() {
        let mut world = CollisionWorld::new();
        let result = world.add_convex_hull(&[Vec3::ZERO, Vec3::X], ContentFlags::SOLID);
        assert!(matches!(result, Err(GeometryError::DegenerateHull(2))));
        assert_eq!(world.collider_count(), 0);
    }

    #[test]
    fn test_remove_collider() {
        let mut world = create_test_world();
        let count = world.collider_count();
        let id = world.add_box(Vec3::ZERO, Vec3::ONE, ContentFlags::SOLID);

        assert!(world.remove(id));
        assert!(!world.remove(id));
        assert_eq!(world.collider_count(), count);
    }

    #[test]
    fn test_clip_against_crease() {
        let planes = [Vec3::NEG_X, Vec3::NEG_Z];
        let clipped = clip_against_planes(Vec3::new(1.0, -1.0, 1.0), &planes);
        assert!(clipped.x.abs() < 1e-6 && clipped.z.abs() < 1e-6);
        assert!((clipped.y + 1.0).abs() < 1e-6);
    }
}
