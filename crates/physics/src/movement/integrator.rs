//! Velocity integration and the final move.
//!
//! Grounded movement blends velocity toward a target on the ground plane;
//! airborne movement adds limited air control and gravity. The final move
//! pushes the capsule through the world and then removes the part of the
//! velocity that ran into an obstacle.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{ContentFlags, PhysicsQuery};

use super::config::LocomotionConfig;
use super::stance::{Stance, StanceState};
use super::state::{KinematicBody, UP};

/// Speed modifier for grounded movement.
///
/// Exactly one of: the slope slide modifier, the decaying slide modifier,
/// the sprint modifier, or one.
pub fn ground_speed_modifier(stance: &StanceState, sprinting: bool, config: &LocomotionConfig, now: f32) -> f32 {
    match stance.stance() {
        Stance::SlidingOnSlope => config.slope_slide_speed_modifier,
        Stance::Sliding => {
            (config.slide_speed - stance.slide_elapsed(now) * config.slide_speed_decay_rate).max(0.0)
        }
        _ if sprinting => config.sprint_speed_modifier,
        _ => 1.0,
    }
}

/// Rotate a horizontal `direction` onto the plane with `normal`.
pub fn reorient_on_slope(direction: Vec3, normal: Vec3) -> Vec3 {
    let right = direction.cross(UP);
    normal.cross(right).normalize_or_zero()
}

/// Blend `velocity` toward the grounded target velocity.
///
/// `wish` is the world-space move input (at most unit length).
pub fn ground_velocity(
    velocity: Vec3,
    wish: Vec3,
    ground_normal: Vec3,
    speed_modifier: f32,
    crouching: bool,
    config: &LocomotionConfig,
    dt: f32,
) -> Vec3 {
    let mut target = wish * config.max_speed_on_ground * speed_modifier;
    if crouching {
        target *= config.max_speed_crouched_ratio;
    }
    let target = reorient_on_slope(target.normalize_or_zero(), ground_normal) * target.length();

    let t = (config.movement_sharpness_on_ground * dt).clamp(0.0, 1.0);
    velocity.lerp(target, t)
}

/// Add air control to `velocity`, limiting horizontal speed.
pub fn air_velocity(velocity: Vec3, wish: Vec3, speed_modifier: f32, config: &LocomotionConfig, dt: f32) -> Vec3 {
    let velocity = velocity + wish * config.acceleration_speed_in_air * dt;
    let vertical = velocity.dot(UP);
    let horizontal = velocity
        .reject_from_normalized(UP)
        .clamp_length_max(config.max_speed_in_air * speed_modifier);
    horizontal + UP * vertical
}

/// Apply one tick of gravity; twice while crouch is held.
pub fn apply_gravity(velocity: Vec3, crouch_held: bool, config: &LocomotionConfig, dt: f32) -> Vec3 {
    let step = UP * (config.gravity_down_force * dt);
    let velocity = velocity - step;
    if crouch_held { velocity - step } else { velocity }
}

/// Velocity right after a jump from the ground.
pub fn jump_velocity(velocity: Vec3, config: &LocomotionConfig) -> Vec3 {
    velocity.reject_from_normalized(UP) + UP * config.jump_force
}

/// Distance-based footstep cue counter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FootstepCounter {
    distance: f32,
}

impl FootstepCounter {
    /// Advance by `speed * dt`. Returns `true` if a footstep is due.
    ///
    /// The check runs before the distance is added, so a cue lags one tick
    /// behind the distance that earned it. Slides never produce footsteps.
    pub fn step(&mut self, speed: f32, dt: f32, interval: f32, sliding: bool) -> bool {
        let due = self.distance >= interval && !sliding;
        if due {
            self.distance = 0.0;
        }
        self.distance += speed * dt;
        due
    }
}

/// Move `body` by `velocity * dt` and resolve the collision response.
///
/// Returns the velocity the body had when it hit something this tick, or
/// zero if it moved freely.
pub fn move_and_collide(world: &dyn PhysicsQuery, body: &mut KinematicBody, dt: f32, mask: ContentFlags) -> Vec3 {
    let capsule = body.capsule();
    let displacement = body.velocity * dt;

    body.position += world.move_capsule(&capsule, displacement, mask);

    let distance = displacement.length();
    if distance <= f32::EPSILON {
        return Vec3::ZERO;
    }

    match world.capsule_cast(&capsule, displacement / distance, distance, mask) {
        Some(hit) => {
            let impact = body.velocity;
            body.velocity = body.velocity.reject_from_normalized(hit.normal);
            impact
        }
        None => Vec3::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionWorld;
    use crate::movement::stance::StanceInput;
    use glam::Quat;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_ground_speed_converges_without_overshoot() {
        let config = LocomotionConfig::default();
        let mut velocity = Vec3::ZERO;
        let mut previous = 0.0;

        for _ in 0..300 {
            velocity = ground_velocity(velocity, Vec3::X, UP, 1.0, false, &config, DT);
            let speed = velocity.length();
            assert!(speed >= previous - 1e-5);
            assert!(speed <= 13.0 + 1e-4);
            previous = speed;
        }
        assert!((previous - 13.0).abs() < 0.01);
    }

    #[test]
    fn test_crouching_halves_target() {
        let config = LocomotionConfig::default();
        let mut velocity = Vec3::ZERO;
        for _ in 0..300 {
            velocity = ground_velocity(velocity, Vec3::X, UP, 1.0, true, &config, DT);
        }
        assert!((velocity.length() - 6.5).abs() < 0.01);
    }

    #[test]
    fn test_reorient_on_slope_keeps_heading() {
        let normal = Quat::from_rotation_z(20f32.to_radians()) * UP;
        let along = reorient_on_slope(Vec3::X, normal);

        assert!((along.length() - 1.0).abs() < 1e-5);
        assert!(along.dot(normal).abs() < 1e-5);
        assert!(along.x > 0.9);
        assert!(along.z.abs() < 1e-5);
    }

    #[test]
    fn test_speed_modifiers() {
        let config = LocomotionConfig::default();
        let mut stance = StanceState::new(&config);

        assert_eq!(ground_speed_modifier(&stance, false, &config, 0.0), 1.0);
        assert_eq!(ground_speed_modifier(&stance, true, &config, 0.0), 2.0);

        let slide = StanceInput {
            crouch_requested: true,
            sprint_held: true,
            grounded: true,
            on_slope: false,
        };
        assert!(stance.evaluate(slide, || true, 1.0));
        assert!((ground_speed_modifier(&stance, false, &config, 1.25) - 1.5).abs() < 1e-5);
        // Decay bottoms out at zero without ending the slide
        assert_eq!(ground_speed_modifier(&stance, false, &config, 5.0), 0.0);
        assert!(stance.is_sliding());

        let on_slope = StanceInput { on_slope: true, ..slide };
        assert!(stance.evaluate(on_slope, || true, 5.0));
        assert_eq!(ground_speed_modifier(&stance, true, &config, 5.0), 2.0);
    }

    #[test]
    fn test_air_speed_is_clamped_horizontally() {
        let config = LocomotionConfig::default();
        let velocity = air_velocity(Vec3::new(30.0, -7.0, 0.0), Vec3::X, 1.0, &config, DT);

        assert!((velocity.reject_from_normalized(UP).length() - 20.0).abs() < 1e-4);
        assert_eq!(velocity.y, -7.0);
    }

    #[test]
    fn test_gravity_doubles_while_crouching() {
        let config = LocomotionConfig::default();
        let normal = apply_gravity(Vec3::ZERO, false, &config, 0.1);
        let crouched = apply_gravity(Vec3::ZERO, true, &config, 0.1);

        assert!((normal.y + 2.5).abs() < 1e-5);
        assert!((crouched.y + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_jump_replaces_vertical_velocity() {
        let config = LocomotionConfig::default();
        let velocity = jump_velocity(Vec3::new(3.0, -2.0, 1.0), &config);
        assert_eq!(velocity, Vec3::new(3.0, 12.0, 1.0));
    }

    #[test]
    fn test_footsteps() {
        let mut counter = FootstepCounter::default();

        // 0.5m per tick: due on the third call
        assert!(!counter.step(5.0, 0.1, 1.0, false));
        assert!(!counter.step(5.0, 0.1, 1.0, false));
        assert!(counter.step(5.0, 0.1, 1.0, false));

        // Sliding suppresses the cue but keeps counting
        assert!(!counter.step(5.0, 0.1, 1.0, false));
        assert!(!counter.step(5.0, 0.1, 1.0, true));
        assert!(counter.step(5.0, 0.1, 1.0, false));
    }

    #[test]
    fn test_landing_records_impact_and_stops_vertical_motion() {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(50.0, 0.5, 50.0),
            ContentFlags::SOLID,
        );

        let mut body = KinematicBody::new(Vec3::new(0.0, 0.3, 0.0), 0.35, 1.8);
        body.velocity = Vec3::new(2.0, -40.0, 0.0);

        let impact = move_and_collide(&world, &mut body, DT, ContentFlags::MASK_PLAYER_SOLID);
        assert_eq!(impact, Vec3::new(2.0, -40.0, 0.0));
        assert!(body.velocity.y.abs() < 1e-3);
        assert!((body.velocity.x - 2.0).abs() < 1e-3);
        assert!(body.position.y >= 0.0 && body.position.y < 0.02);
    }

    #[test]
    fn test_free_move_has_no_impact() {
        let world = CollisionWorld::new();
        let mut body = KinematicBody::new(Vec3::ZERO, 0.35, 1.8);
        body.velocity = Vec3::new(6.0, 0.0, 0.0);

        let impact = move_and_collide(&world, &mut body, 0.5, ContentFlags::MASK_PLAYER_SOLID);
        assert_eq!(impact, Vec3::ZERO);
        assert_eq!(body.position, Vec3::new(3.0, 0.0, 0.0));
    }
}
