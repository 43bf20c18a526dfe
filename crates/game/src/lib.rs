//! Momentum Game Logic
//!
//! This crate contains the game-side collaborators of the locomotion core:
//!
//! - Player health and death notification
//! - Camera tilt playback
//! - Input conversion and queueing
//! - Level geometry, spawn points and trigger volumes
//! - A fixed-rate simulation stepping every player
//!
//! # Architecture
//!
//! Each player owns a [`LocomotionController`](momentum_physics::LocomotionController)
//! wired to a shared health and an input queue. The simulation converts raw
//! input to commands, steps the controllers against the level geometry, and
//! reacts to what they report.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Game Simulation                         │
//! │  ┌─────────┐    ┌────────────┐    ┌──────────────────────┐  │
//! │  │ Input   │───►│ Locomotion │───►│ Tick reports         │  │
//! │  │ Queue   │    │ controller │    │ (events, snapshots)  │  │
//! │  └─────────┘    └────────────┘    └──────────────────────┘  │
//! │                   │        ▲                                 │
//! │                   ▼        │                                 │
//! │               ┌──────────────┐    ┌──────────────────────┐  │
//! │               │ Health       │◄───│ Level triggers       │  │
//! │               └──────────────┘    └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod camera;
pub mod health;
pub mod input;
pub mod level;
pub mod player;
pub mod simulation;

// Re-export main types
pub use camera::CameraTilt;
pub use health::{Health, SharedHealth};
pub use input::{InputQueue, PlayerInput};
pub use level::{Level, LevelDescription, SpawnPoint, TriggerAction};
pub use player::{EntityId, Player, PlayerStats};
pub use simulation::{Simulation, SimulationConfig};

// Re-export physics types for convenience
pub use momentum_physics::{
    CollisionWorld, ContentFlags, LocomotionConfig, LocomotionController, LocomotionEvent, LocomotionSnapshot,
    PlayerCommand, TickReport,
};
