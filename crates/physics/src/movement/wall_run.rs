//! Wall detection and the wall-run state machine.
//!
//! While airborne and sprinting the player probes sideways with two rays.
//! A vertical wall close enough, passed fast enough, starts a wall run: the
//! player moves along the wall under reduced gravity until they slow down,
//! lose the wall, crouch, jump off or land.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{ContentFlags, PhysicsQuery, ShapeHit};

use super::config::LocomotionConfig;
use super::events::{Easing, LocomotionEvent, TiltRequest};
use super::state::{KinematicBody, UP};

/// How far from horizontal a wall normal may lean and still be runnable.
pub const WALL_NORMAL_VERTICAL_TOLERANCE: f32 = 0.05;

/// Lateral wall probe.
pub struct WallProbe<'a> {
    world: &'a dyn PhysicsQuery,
    config: &'a LocomotionConfig,
}

impl<'a> WallProbe<'a> {
    pub fn new(world: &'a dyn PhysicsQuery, config: &'a LocomotionConfig) -> Self {
        Self { world, config }
    }

    /// Find the closest runnable surface to the left or right of `body`.
    ///
    /// Surfaces flagged [`ContentFlags::NO_WALL_RUN`] count as misses.
    pub fn find_wall(&self, body: &KinematicBody) -> Option<ShapeHit> {
        let right = body.right_direction();
        let left_hit = self.cast(body, -right);
        let right_hit = self.cast(body, right);

        match (left_hit, right_hit) {
            (Some(left), Some(right)) if right.distance < left.distance => Some(right),
            (Some(left), _) => Some(left),
            (None, right) => right,
        }
    }

    /// Check if the wall behind `wall_normal` is still within reach.
    pub fn still_touching(&self, body: &KinematicBody, wall_normal: Vec3) -> bool {
        self.world
            .raycast(
                body.center(),
                -wall_normal,
                self.config.wall_run_trigger_distance,
                self.config.wall_run_layers,
            )
            .is_some()
    }

    fn cast(&self, body: &KinematicBody, direction: Vec3) -> Option<ShapeHit> {
        self.world
            .raycast(
                body.center(),
                direction,
                self.config.wall_run_trigger_distance,
                self.config.wall_run_layers,
            )
            .filter(|hit| !hit.contents.contains(ContentFlags::NO_WALL_RUN))
    }
}

/// Per-tick conditions the wall-run state machine depends on.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallRunInput {
    pub grounded: bool,
    pub sprinting: bool,
    pub crouch_held: bool,
}

/// Wall-run state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WallRunState {
    is_wall_running: bool,
    wall_normal: Vec3,
    /// Unit, horizontal, tangent to the wall.
    run_direction: Vec3,
    /// No new run may start before this time.
    cooldown_until: f32,
}

impl WallRunState {
    #[inline]
    pub fn is_wall_running(&self) -> bool {
        self.is_wall_running
    }

    #[inline]
    pub fn wall_normal(&self) -> Vec3 {
        self.wall_normal
    }

    #[inline]
    pub fn run_direction(&self) -> Vec3 {
        self.run_direction
    }

    #[inline]
    pub fn cooldown_until(&self) -> f32 {
        self.cooldown_until
    }

    /// Run exit checks, then entry checks, for this tick.
    ///
    /// Exit: landing, crouching, slowing below the sustain speed along the
    /// run, or losing the wall. Entry: airborne, sprinting, off cooldown and
    /// next to a vertical wall passed at the trigger speed.
    pub fn evaluate(
        &mut self,
        probe: &WallProbe<'_>,
        body: &mut KinematicBody,
        input: WallRunInput,
        now: f32,
        events: &mut Vec<LocomotionEvent>,
    ) {
        let config = probe.config;

        if self.is_wall_running {
            let exit = input.grounded
                || input.crouch_held
                || body.velocity.dot(self.run_direction) <= config.wall_run_min_sustain_speed
                || !probe.still_touching(body, self.wall_normal);
            if exit {
                self.stop(body.pitch, now, config, events);
            }
        }

        if input.grounded || !input.sprinting || self.is_wall_running || now < self.cooldown_until {
            return;
        }

        let Some(hit) = probe.find_wall(body) else {
            return;
        };

        let vertical = hit.normal.dot(UP).abs();
        let along_wall = UP.cross(hit.normal).dot(body.velocity).abs();
        if vertical > WALL_NORMAL_VERTICAL_TOLERANCE || along_wall < config.wall_run_min_trigger_speed {
            return;
        }

        self.start(hit.normal, body, config, events);
    }

    /// End the run, starting the cooldown. Does nothing if not running.
    pub fn stop(&mut self, pitch: f32, now: f32, config: &LocomotionConfig, events: &mut Vec<LocomotionEvent>) {
        if !self.is_wall_running {
            return;
        }

        self.is_wall_running = false;
        self.cooldown_until = now + config.wall_run_cooldown;
        log::debug!("wall run stopped, cooldown until {:.2}", self.cooldown_until);

        events.push(LocomotionEvent::WallRunStopped);
        events.push(LocomotionEvent::CameraTilt(TiltRequest {
            pitch: pitch.to_degrees(),
            yaw: 0.0,
            roll: 0.0,
            duration: config.wall_run_tilt_time,
            easing: Easing::InOutCubic,
        }));
    }

    /// Velocity while running: along the wall at the current horizontal
    /// speed, with reduced gravity on top of the vertical component.
    pub fn run_velocity(&self, horizontal: Vec3, vertical: f32, config: &LocomotionConfig, dt: f32) -> Vec3 {
        self.run_direction * horizontal.length()
            - UP * (config.gravity_down_force * config.wall_run_gravity_modifier * dt)
            + UP * vertical
    }

    /// Velocity of a jump off the wall.
    pub fn jump_velocity(&self, horizontal: Vec3, config: &LocomotionConfig) -> Vec3 {
        let away = (self.wall_normal + self.run_direction).normalize_or_zero();
        UP * config.jump_from_wall_force + away * horizontal.length()
    }

    fn start(
        &mut self,
        normal: Vec3,
        body: &mut KinematicBody,
        config: &LocomotionConfig,
        events: &mut Vec<LocomotionEvent>,
    ) {
        if body.velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }

        let mut run_direction = UP.cross(normal).normalize_or_zero();
        let mut tilt = 1.0;
        if body.velocity.dot(run_direction) < 0.0 {
            run_direction = -run_direction;
            tilt = -1.0;
        }

        self.is_wall_running = true;
        self.wall_normal = normal;
        self.run_direction = run_direction;
        log::debug!("wall run started along {run_direction:?}");

        events.push(LocomotionEvent::WallRunStarted);
        events.push(LocomotionEvent::CameraTilt(TiltRequest {
            pitch: body.pitch.to_degrees(),
            yaw: 0.0,
            roll: config.wall_run_tilt_angle * tilt,
            duration: config.wall_run_tilt_time,
            easing: Easing::InOutCubic,
        }));
    }
}
