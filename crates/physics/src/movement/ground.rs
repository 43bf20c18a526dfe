//! Ground detection.
//!
//! Casts the body capsule a short distance down once per tick. While already
//! grounded the probe reaches a little further and pulls the body down onto
//! the surface, so walking down ramps and over small bumps keeps contact.
//! While airborne it only reaches [`GROUND_CHECK_DISTANCE_IN_AIR`] so the body
//! never snaps to ground it is merely passing over.

use crate::collision::PhysicsQuery;

use super::config::{GROUND_CHECK_DISTANCE_IN_AIR, LocomotionConfig};
use super::state::{GroundInfo, KinematicBody, UP};

/// Probe for ground under `body`, snapping it down onto valid ground.
///
/// `suppressed` skips the probe entirely; it is set for a short time after a
/// jump so the body does not immediately re-ground.
pub fn probe_ground(
    world: &dyn PhysicsQuery,
    body: &mut KinematicBody,
    config: &LocomotionConfig,
    was_grounded: bool,
    suppressed: bool,
) -> GroundInfo {
    let mut info = GroundInfo::airborne();
    if suppressed {
        return info;
    }

    let check_distance = if was_grounded {
        config.skin_width + config.ground_check_distance
    } else {
        GROUND_CHECK_DISTANCE_IN_AIR
    };

    let capsule = body.capsule();
    let Some(hit) = world.capsule_cast(&capsule, -UP, check_distance, config.ground_check_layers)
    else {
        return info;
    };

    info.normal = hit.normal;
    info.distance_to_ground = hit.distance;

    let angle = hit.normal.angle_between(UP).to_degrees();
    if hit.normal.dot(UP) > 0.0 && angle <= config.slope_limit {
        info.is_grounded = true;
        info.is_on_slope = angle >= config.slope_angle;

        if hit.distance > config.skin_width {
            let applied = world.move_capsule(&capsule, -UP * hit.distance, config.ground_check_layers);
            body.position += applied;
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Capsule, ColliderId, CollisionWorld, ContentFlags, ShapeHit};
    use glam::{Quat, Vec3};

    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(50.0, 0.5, 50.0),
            ContentFlags::SOLID,
        );
        world
    }

    fn body_at(position: Vec3) -> KinematicBody {
        KinematicBody::new(position, 0.35, 1.8)
    }

    /// Reports the same hit for every downward cast within range.
    struct FixedGround {
        distance: f32,
        normal: Vec3,
    }

    impl PhysicsQuery for FixedGround {
        fn capsule_cast(
            &self,
            _capsule: &Capsule,
            _direction: Vec3,
            max_distance: f32,
            _mask: ContentFlags,
        ) -> Option<ShapeHit> {
            (self.distance <= max_distance).then_some(ShapeHit {
                distance: self.distance,
                point: Vec3::ZERO,
                normal: self.normal,
                collider: ColliderId(1),
                contents: ContentFlags::SOLID,
            })
        }

        fn raycast(&self, _: Vec3, _: Vec3, _: f32, _: ContentFlags) -> Option<ShapeHit> {
            None
        }

        fn overlap_capsule(&self, _: &Capsule, _: ContentFlags) -> Vec<ColliderId> {
            Vec::new()
        }

        fn move_capsule(&self, _: &Capsule, displacement: Vec3, _: ContentFlags) -> Vec3 {
            displacement
        }
    }

    #[test]
    fn test_resting_body_is_grounded() {
        let world = create_test_world();
        let config = LocomotionConfig::default();
        let mut body = body_at(Vec3::new(0.0, 0.01, 0.0));

        let ground = probe_ground(&world, &mut body, &config, false, false);
        assert!(ground.is_grounded);
        assert!(!ground.is_on_slope);
        assert!(ground.normal.y > 0.99);
        assert!(ground.distance_to_ground < 0.02);
    }

    #[test]
    fn test_airborne_probe_is_short() {
        let world = create_test_world();
        let config = LocomotionConfig::default();
        let mut body = body_at(Vec3::new(0.0, 0.1, 0.0));

        // 0.1 above the floor is out of reach while airborne...
        let ground = probe_ground(&world, &mut body, &config, false, false);
        assert!(!ground.is_grounded);
        assert_eq!(ground.distance_to_ground, f32::INFINITY);

        // ...but within reach while grounded, and the body is snapped down.
        let ground = probe_ground(&world, &mut body, &config, true, false);
        assert!(ground.is_grounded);
        assert!(body.position.y < 0.02, "y={}", body.position.y);
    }

    #[test]
    fn test_suppressed_probe_reports_airborne() {
        let world = create_test_world();
        let config = LocomotionConfig::default();
        let mut body = body_at(Vec3::new(0.0, 0.01, 0.0));

        let ground = probe_ground(&world, &mut body, &config, true, true);
        assert!(!ground.is_grounded);
        assert_eq!(ground.normal, UP);
    }

    #[test]
    fn test_steep_surface_is_not_ground() {
        let config = LocomotionConfig::default();
        let world = FixedGround {
            distance: 0.01,
            normal: Quat::from_rotation_x(60f32.to_radians()) * UP,
        };
        let mut body = body_at(Vec3::ZERO);

        let ground = probe_ground(&world, &mut body, &config, true, false);
        assert!(!ground.is_grounded);
        // The normal is still reported
        assert!(ground.normal.y < 0.6);
    }

    #[test]
    fn test_slope_flag() {
        let config = LocomotionConfig::default();
        let world = FixedGround {
            distance: 0.01,
            normal: Quat::from_rotation_x(30f32.to_radians()) * UP,
        };
        let mut body = body_at(Vec3::ZERO);

        let ground = probe_ground(&world, &mut body, &config, true, false);
        assert!(ground.is_grounded);
        assert!(ground.is_on_slope);
    }

    #[test]
    fn test_snap_only_beyond_skin_width() {
        let config = LocomotionConfig::default();
        let mut body = body_at(Vec3::ZERO);

        let near = FixedGround { distance: 0.05, normal: UP };
        probe_ground(&near, &mut body, &config, true, false);
        assert_eq!(body.position, Vec3::ZERO);

        let far = FixedGround { distance: 0.1, normal: UP };
        probe_ground(&far, &mut body, &config, true, false);
        assert!((body.position.y + 0.1).abs() < 1e-6);
    }
}
