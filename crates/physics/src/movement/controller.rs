//! Locomotion controller.
//!
//! This is the main entry point for player movement. Each tick it polls
//! input, probes the world, advances the stance and wall-run state machines,
//! integrates velocity and moves the body, then reports what happened.

use std::f32::consts::{PI, TAU};
use std::mem;

use glam::Vec3;

use crate::collision::{ColliderId, ContentFlags, PhysicsQuery};

use super::config::{JUMP_GROUNDING_PREVENTION_TIME, LocomotionConfig, MAX_DELTA_TIME, PITCH_LIMIT_DEGREES};
use super::error::ConfigError;
use super::events::{Easing, HudStance, LocomotionEvent, TickReport, TiltRequest};
use super::ground::probe_ground;
use super::health::{DamageSource, DeathSignal, HealthService, SubscriptionId};
use super::input::InputProvider;
use super::integrator::{
    FootstepCounter, air_velocity, apply_gravity, ground_speed_modifier, ground_velocity, jump_velocity,
    move_and_collide,
};
use super::stance::{StanceInput, StanceState, smooth_height};
use super::state::{
    CommandButtons, GroundInfo, KinematicBody, LocomotionSnapshot, MovementFlags, PlayerCommand, UP,
};
use super::wall_run::{WallProbe, WallRunInput, WallRunState};

/// Furthest a spawning body is dropped to find ground.
const SPAWN_GROUND_SEARCH_DISTANCE: f32 = 3.0;

/// Mask for the body's own movement.
const MOVE_MASK: ContentFlags = ContentFlags::MASK_PLAYER_SOLID;

/// Builder for [`LocomotionController`].
///
/// Input and health collaborators are required.
pub struct LocomotionControllerBuilder {
    config: LocomotionConfig,
    input: Option<Box<dyn InputProvider>>,
    health: Option<Box<dyn HealthService>>,
    position: Vec3,
    yaw: f32,
    own_collider: Option<ColliderId>,
}

impl LocomotionControllerBuilder {
    pub fn input(mut self, input: impl InputProvider + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    pub fn health(mut self, health: impl HealthService + 'static) -> Self {
        self.health = Some(Box::new(health));
        self
    }

    /// Feet position at spawn.
    pub fn spawn_at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Initial yaw in radians.
    pub fn facing(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    /// Collider representing this body in the world, ignored when checking
    /// for room to stand.
    pub fn own_collider(mut self, id: ColliderId) -> Self {
        self.own_collider = Some(id);
        self
    }

    /// Validate the configuration and build the controller.
    pub fn build(self) -> Result<LocomotionController, ConfigError> {
        self.config.validate()?;
        let input = self.input.ok_or(ConfigError::MissingCollaborator("input"))?;
        let mut health = self.health.ok_or(ConfigError::MissingCollaborator("health"))?;

        let death_signal = DeathSignal::new();
        let death_subscription = health.subscribe_death(death_signal.clone());

        let mut body = KinematicBody::new(
            self.position,
            self.config.capsule_radius,
            self.config.capsule_height_standing,
        );
        body.yaw = wrap_angle(self.yaw);

        let mut stance = StanceState::new(&self.config);
        stance.reset();

        log::debug!("locomotion controller spawned at {:?}", self.position);

        Ok(LocomotionController {
            input,
            health,
            death_signal,
            death_subscription,
            body,
            flags: MovementFlags::default(),
            ground: GroundInfo::airborne(),
            stance,
            wall_run: WallRunState::default(),
            footsteps: FootstepCounter::default(),
            last_impact: Vec3::ZERO,
            last_jump_time: f32::NEG_INFINITY,
            previous_buttons: CommandButtons::default(),
            external_velocity: None,
            hud_stance: HudStance::Standing,
            own_collider: self.own_collider,
            pending_events: Vec::new(),
            now: 0.0,
            config: self.config,
        })
    }
}

/// First-person locomotion controller.
///
/// Owns the body and all locomotion state. The physics world is borrowed
/// for each tick only.
///
/// # Example
///
/// ```ignore
/// let mut controller = LocomotionController::builder(LocomotionConfig::default())
///     .input(move || next_command())
///     .health(health)
///     .spawn_at(spawn_position)
///     .build()?;
///
/// // Each frame:
/// let report = controller.tick(&world, delta_time);
/// ```
pub struct LocomotionController {
    config: LocomotionConfig,
    input: Box<dyn InputProvider>,
    health: Box<dyn HealthService>,
    death_signal: DeathSignal,
    death_subscription: SubscriptionId,
    body: KinematicBody,
    flags: MovementFlags,
    ground: GroundInfo,
    stance: StanceState,
    wall_run: WallRunState,
    footsteps: FootstepCounter,
    /// Velocity at the last obstruction, consumed on landing.
    last_impact: Vec3,
    last_jump_time: f32,
    previous_buttons: CommandButtons,
    external_velocity: Option<Vec3>,
    hud_stance: HudStance,
    own_collider: Option<ColliderId>,
    /// Events raised between ticks, reported with the next tick.
    pending_events: Vec<LocomotionEvent>,
    /// Seconds simulated so far.
    now: f32,
}

impl Drop for LocomotionController {
    fn drop(&mut self) {
        self.health.unsubscribe_death(self.death_subscription);
    }
}

impl LocomotionController {
    pub fn builder(config: LocomotionConfig) -> LocomotionControllerBuilder {
        LocomotionControllerBuilder {
            config,
            input: None,
            health: None,
            position: Vec3::ZERO,
            yaw: 0.0,
            own_collider: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    #[inline]
    pub fn body(&self) -> &KinematicBody {
        &self.body
    }

    #[inline]
    pub fn flags(&self) -> MovementFlags {
        self.flags
    }

    #[inline]
    pub fn ground(&self) -> &GroundInfo {
        &self.ground
    }

    #[inline]
    pub fn stance(&self) -> &StanceState {
        &self.stance
    }

    #[inline]
    pub fn wall_run(&self) -> &WallRunState {
        &self.wall_run
    }

    /// Seconds simulated so far.
    #[inline]
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Replace the computed velocity with `velocity` until cleared.
    ///
    /// Used for grapples and other tows. Crouching, sprinting and jumping
    /// are disabled while towed.
    pub fn set_external_velocity(&mut self, velocity: Option<Vec3>) {
        self.external_velocity = velocity;
        self.flags.set(MovementFlags::TOWED, velocity.is_some());
    }

    /// Kill the player immediately.
    pub fn kill(&mut self) {
        if self.flags.dead() {
            return;
        }
        self.health.kill();
        self.mark_dead();
    }

    /// Drop the body onto the ground below it, if any is within reach.
    ///
    /// Returns `true` if ground was found. Call once after spawning.
    pub fn snap_to_ground(&mut self, world: &dyn PhysicsQuery) -> bool {
        let capsule = self.body.capsule();
        let Some(hit) = world.capsule_cast(&capsule, -UP, SPAWN_GROUND_SEARCH_DISTANCE, MOVE_MASK) else {
            return false;
        };

        self.body.position += world.move_capsule(&capsule, -UP * hit.distance, MOVE_MASK);
        self.ground = probe_ground(world, &mut self.body, &self.config, true, false);
        self.sync_flags();
        self.ground.is_grounded
    }

    /// Current observable state.
    pub fn snapshot(&self) -> LocomotionSnapshot {
        LocomotionSnapshot {
            is_grounded: self.ground.is_grounded,
            is_crouching: self.stance.is_crouching(),
            is_sliding: self.stance.is_sliding(),
            is_sliding_on_slope: self.stance.is_sliding_on_slope(),
            is_sprinting: self.flags.sprinting(),
            is_wall_running: self.wall_run.is_wall_running(),
            is_jumping: self.flags.has(MovementFlags::JUMPING),
            is_dead: self.flags.dead(),
            velocity: self.body.velocity,
            position: self.body.position,
            yaw: self.body.yaw,
            pitch: self.body.pitch,
            height: self.body.height,
            eye_height: self.config.eye_height(self.body.height),
            hud_stance: self.hud_stance,
        }
    }

    /// Advance the simulation by `delta_time` seconds.
    pub fn tick(&mut self, world: &dyn PhysicsQuery, delta_time: f32) -> TickReport {
        let dt = delta_time.clamp(0.0, MAX_DELTA_TIME);
        self.now += dt;

        let command = self.input.poll();
        let jump_pressed = command.wants_jump() && !self.previous_buttons.pressed(CommandButtons::JUMP);
        self.previous_buttons = command.buttons;

        self.check_out_of_bounds();
        self.sync_death();
        if self.flags.dead() {
            return self.report();
        }

        // Ground
        let was_grounded = self.ground.is_grounded;
        let suppressed = self.now < self.last_jump_time + JUMP_GROUNDING_PREVENTION_TIME;
        self.ground = probe_ground(world, &mut self.body, &self.config, was_grounded, suppressed);

        if self.ground.is_grounded && !was_grounded {
            self.land();
            self.sync_death();
            if self.flags.dead() {
                return self.report();
            }
        }

        // Stance
        let towed = self.external_velocity.is_some();
        self.update_stance(world, &command, towed, dt);

        // Wall run
        let probe = WallProbe::new(world, &self.config);
        let wall_input = WallRunInput {
            grounded: self.ground.is_grounded,
            sprinting: self.flags.sprinting(),
            crouch_held: command.wants_crouch(),
        };
        self.wall_run
            .evaluate(&probe, &mut self.body, wall_input, self.now, &mut self.pending_events);

        // Velocity
        self.update_look(&command);
        self.integrate(world, &command, jump_pressed && !towed, dt);

        if let Some(velocity) = self.external_velocity {
            self.body.velocity = velocity;
        }
        self.last_impact = move_and_collide(world, &mut self.body, dt, MOVE_MASK);

        self.sync_flags();
        self.update_hud_stance();
        self.report()
    }

    // ========================================================================
    // Death
    // ========================================================================

    fn check_out_of_bounds(&mut self) {
        if !self.flags.dead() && self.body.position.y < self.config.kill_height {
            log::warn!("y-kill at {:?}", self.body.position);
            self.health.kill();
            self.mark_dead();
        }
    }

    fn sync_death(&mut self) {
        if !self.flags.dead() && self.death_signal.is_fired() {
            self.mark_dead();
        }
    }

    fn mark_dead(&mut self) {
        if self.flags.dead() {
            return;
        }
        self.death_signal.fire();
        self.flags.set(MovementFlags::DEAD, true);
        self.pending_events.push(LocomotionEvent::Died);
        log::info!("player died at {:?}", self.body.position);
    }

    // ========================================================================
    // Landing
    // ========================================================================

    fn land(&mut self) {
        let fall_speed = -self.body.velocity.y.min(self.last_impact.y);
        self.last_impact = Vec3::ZERO;

        match self.config.fall_damage(fall_speed) {
            Some(amount) => {
                log::debug!("hard landing at {fall_speed:.1} m/s: {amount:.1} damage");
                self.health.take_damage(amount, DamageSource::Fall);
                self.pending_events.push(LocomotionEvent::FallDamage { amount });
            }
            None => {
                log::debug!("landed at {fall_speed:.1} m/s");
                self.pending_events.push(LocomotionEvent::Landed);
            }
        }
    }

    // ========================================================================
    // Stance
    // ========================================================================

    fn update_stance(&mut self, world: &dyn PhysicsQuery, command: &PlayerCommand, towed: bool, dt: f32) {
        if self.stance.take_due_slide_pitch(self.now) {
            self.body.pitch = -self.config.sliding_tilt_angle.to_radians();
        }

        let input = StanceInput {
            crouch_requested: command.wants_crouch() && !towed,
            sprint_held: command.wants_sprint(),
            grounded: self.ground.is_grounded,
            on_slope: self.ground.is_on_slope,
        };

        let was_sliding = self.stance.is_sliding();
        let (body, config, own) = (&self.body, &self.config, self.own_collider);
        let changed = self
            .stance
            .evaluate(input, || has_room_to_stand(world, body, config, own), self.now);

        if changed && !was_sliding && self.stance.is_sliding() {
            self.pending_events.push(LocomotionEvent::CameraTilt(TiltRequest {
                pitch: -self.config.sliding_tilt_angle,
                yaw: 0.0,
                roll: 0.0,
                duration: self.config.sliding_tilt_time,
                easing: Easing::InOutCubic,
            }));
        }

        let sprinting = command.wants_sprint() && !self.stance.is_sliding() && !self.stance.is_crouching() && !towed;
        self.flags.set(MovementFlags::SPRINTING, sprinting);

        self.body.target_height = self.stance.target_height();
        self.body.height = smooth_height(
            self.body.height,
            self.body.target_height,
            self.config.crouching_sharpness,
            dt,
        );
    }

    // ========================================================================
    // Integration
    // ========================================================================

    fn update_look(&mut self, command: &PlayerCommand) {
        let multiplier = if command.wants_aim() {
            self.config.aiming_rotation_multiplier
        } else {
            1.0
        };
        let scale = self.config.rotation_speed * multiplier;

        self.body.yaw = wrap_angle(self.body.yaw + (command.look.x * scale).to_radians());

        let limit = PITCH_LIMIT_DEGREES.to_radians();
        self.body.pitch = (self.body.pitch + (command.look.y * scale).to_radians()).clamp(-limit, limit);
    }

    fn integrate(&mut self, world: &dyn PhysicsQuery, command: &PlayerCommand, jumping: bool, dt: f32) {
        let sprinting = self.flags.sprinting();
        let sprint_modifier = if sprinting { self.config.sprint_speed_modifier } else { 1.0 };
        let wish = self.body.to_world(command.movement_input());

        self.flags.set(MovementFlags::JUMPING, jumping);
        self.flags.set(MovementFlags::JUMPED_THIS_TICK, false);

        if self.ground.is_grounded {
            let modifier = ground_speed_modifier(&self.stance, sprinting, &self.config, self.now);
            self.body.velocity = ground_velocity(
                self.body.velocity,
                wish,
                self.ground.normal,
                modifier,
                self.stance.is_crouching(),
                &self.config,
                dt,
            );

            if jumping {
                self.jump(world);
            }

            self.count_footstep(sprinting, dt);
            return;
        }

        self.body.velocity = air_velocity(self.body.velocity, wish, sprint_modifier, &self.config, dt);

        if !self.wall_run.is_wall_running() {
            self.body.velocity = apply_gravity(self.body.velocity, command.wants_crouch(), &self.config, dt);
            return;
        }

        let horizontal = self.body.horizontal_velocity();
        if jumping {
            self.body.velocity = self.wall_run.jump_velocity(horizontal, &self.config);
            self.wall_run
                .stop(self.body.pitch, self.now, &self.config, &mut self.pending_events);
            self.flags.set(MovementFlags::JUMPED_THIS_TICK, true);
            self.pending_events.push(LocomotionEvent::Jumped);
            log::debug!("wall jump");
        } else {
            let vertical = self.body.velocity.dot(UP);
            self.body.velocity = self.wall_run.run_velocity(horizontal, vertical, &self.config, dt);
            self.count_footstep(sprinting, dt);
        }
    }

    fn jump(&mut self, world: &dyn PhysicsQuery) {
        let (body, config, own) = (&self.body, &self.config, self.own_collider);
        if !self.stance.stand_up(|| has_room_to_stand(world, body, config, own)) {
            log::info!("jump refused: no room to stand");
            return;
        }
        self.body.target_height = self.stance.target_height();

        self.body.velocity = jump_velocity(self.body.velocity, &self.config);
        self.last_jump_time = self.now;
        self.ground = GroundInfo::airborne();
        self.flags.set(MovementFlags::JUMPED_THIS_TICK, true);
        self.pending_events.push(LocomotionEvent::Jumped);
        log::debug!("jump at {:?}", self.body.position);
    }

    fn count_footstep(&mut self, sprinting: bool, dt: f32) {
        let interval = self.config.footstep_interval(sprinting);
        if self
            .footsteps
            .step(self.body.velocity.length(), dt, interval, self.stance.is_sliding())
        {
            self.pending_events.push(LocomotionEvent::Footstep);
        }
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    fn sync_flags(&mut self) {
        self.flags.set(MovementFlags::ON_GROUND, self.ground.is_grounded);
        self.flags.set(MovementFlags::ON_SLOPE, self.ground.is_on_slope);
        self.flags.set(MovementFlags::CROUCHING, self.stance.is_crouching());
        self.flags.set(MovementFlags::SLIDING, self.stance.is_sliding());
        self.flags.set(MovementFlags::SLIDING_ON_SLOPE, self.stance.is_sliding_on_slope());
        self.flags.set(MovementFlags::WALL_RUNNING, self.wall_run.is_wall_running());
        self.flags.set(MovementFlags::TOWED, self.external_velocity.is_some());
    }

    fn update_hud_stance(&mut self) {
        let hud = if !self.ground.is_grounded {
            if self.wall_run.is_wall_running() {
                HudStance::WallRun
            } else {
                HudStance::Jumping
            }
        } else if self.stance.is_crouching() {
            HudStance::Crouching
        } else if self.stance.is_sliding() || self.stance.is_sliding_on_slope() {
            HudStance::Sliding
        } else if self.flags.sprinting() {
            HudStance::Sprinting
        } else {
            HudStance::Standing
        };

        if hud != self.hud_stance {
            self.hud_stance = hud;
            self.pending_events.push(LocomotionEvent::StanceChanged(hud));
        }
    }

    fn report(&mut self) -> TickReport {
        TickReport {
            events: mem::take(&mut self.pending_events),
            snapshot: self.snapshot(),
        }
    }
}

/// Check whether a standing capsule fits where `body` is.
fn has_room_to_stand(
    world: &dyn PhysicsQuery,
    body: &KinematicBody,
    config: &LocomotionConfig,
    own_collider: Option<ColliderId>,
) -> bool {
    let standing = body.capsule_with_height(config.capsule_height_standing);
    world
        .overlap_capsule(&standing, MOVE_MASK)
        .into_iter()
        .all(|id| Some(id) == own_collider)
}

/// Wrap an angle to (-PI, PI].
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}
