//! First-person locomotion.
//!
//! This module implements momentum-based FPS movement with:
//!
//! - Ground movement blended toward a target velocity on the ground plane
//! - Crouching, sprint slides and slope slides
//! - Air control under gravity
//! - Wall-running and wall jumps
//! - Fall damage and out-of-bounds deaths
//!
//! # Design
//!
//! Movement is driven by the [`LocomotionController`], which polls an
//! [`InputProvider`], deals damage through a [`HealthService`] and moves its
//! [`KinematicBody`] through a borrowed [`PhysicsQuery`](crate::collision::PhysicsQuery)
//! once per tick.

mod config;
mod controller;
mod error;
mod events;
mod ground;
mod health;
mod input;
mod integrator;
mod stance;
mod state;
mod wall_run;

pub use config::{
    GROUND_CHECK_DISTANCE_IN_AIR, JUMP_GROUNDING_PREVENTION_TIME, LocomotionConfig, MAX_DELTA_TIME,
    PITCH_LIMIT_DEGREES,
};
pub use controller::{LocomotionController, LocomotionControllerBuilder};
pub use error::ConfigError;
pub use events::{Easing, HudStance, LocomotionEvent, TickReport, TiltRequest};
pub use ground::probe_ground;
pub use health::{DamageSource, DeathSignal, HealthService, SubscriptionId};
pub use input::InputProvider;
pub use integrator::FootstepCounter;
pub use stance::{Stance, StanceInput, StanceState};
pub use state::{CommandButtons, GroundInfo, KinematicBody, LocomotionSnapshot, MovementFlags, PlayerCommand, UP};
pub use wall_run::{WALL_NORMAL_VERTICAL_TOLERANCE, WallProbe, WallRunInput, WallRunState};
