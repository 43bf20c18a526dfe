//! Collision queries for character movement.
//!
//! # Key Types
//!
//! - [`PhysicsQuery`]: What the locomotion core needs from a physics world
//! - [`CollisionWorld`]: Static geometry answering those queries via parry3d
//! - [`Capsule`]: The query shape
//! - [`ShapeHit`]: Output from a cast that hit something
//!
//! Every collider carries [`ContentFlags`]; every query carries a mask.

mod flags;
mod query;
mod shape;
mod world;

pub use flags::ContentFlags;
pub use query::PhysicsQuery;
pub use shape::{Capsule, ColliderId, ShapeHit};
pub use world::{CollisionWorld, DEFAULT_CONTACT_OFFSET, GeometryError};
