//! Momentum Physics
//!
//! First-person locomotion core: grounded movement, crouching and sliding,
//! slope slides, air control, wall-running, jumping and fall damage, driven
//! once per tick against a borrowed physics world.
//!
//! # Architecture
//!
//! The crate is split into two systems:
//!
//! - **Collision**: The [`PhysicsQuery`] interface the core asks questions
//!   through, and [`CollisionWorld`], a parry3d-backed implementation for
//!   static geometry
//! - **Movement**: The [`LocomotionController`] and the state machines it
//!   orchestrates
//!
//! The core never owns world geometry, plays sounds or moves cameras. It
//! reports what happened in a [`TickReport`] and leaves presentation to the
//! game.

pub mod collision;
pub mod movement;

// Re-export commonly used types
pub use collision::{Capsule, ColliderId, CollisionWorld, ContentFlags, GeometryError, PhysicsQuery, ShapeHit};
pub use movement::{
    CommandButtons, ConfigError, DamageSource, DeathSignal, Easing, HealthService, HudStance, InputProvider,
    LocomotionConfig, LocomotionController, LocomotionEvent, LocomotionSnapshot, MovementFlags, PlayerCommand,
    SubscriptionId, TickReport, TiltRequest,
};
