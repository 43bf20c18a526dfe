//! Player entity and state.

use std::fmt;

use glam::Vec3;
use momentum_physics::{
    ConfigError, LocomotionConfig, LocomotionController, LocomotionEvent, LocomotionSnapshot, PhysicsQuery,
    PlayerCommand, TickReport,
};
use serde::{Deserialize, Serialize};

use crate::camera::CameraTilt;
use crate::health::SharedHealth;
use crate::input::InputQueue;
use crate::level::SpawnPoint;

/// Unique identifier for entities.
pub type EntityId = u32;

/// Counters accumulated from locomotion events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub jumps: u32,
    pub wall_runs: u32,
    pub footsteps: u32,
    pub landings: u32,
    pub hard_landings: u32,
    pub deaths: u32,
}

impl PlayerStats {
    fn record(&mut self, event: &LocomotionEvent) {
        match event {
            LocomotionEvent::Jumped => self.jumps += 1,
            LocomotionEvent::WallRunStarted => self.wall_runs += 1,
            LocomotionEvent::Footstep => self.footsteps += 1,
            LocomotionEvent::Landed => self.landings += 1,
            LocomotionEvent::FallDamage { .. } => {
                self.landings += 1;
                self.hard_landings += 1;
            }
            LocomotionEvent::Died => self.deaths += 1,
            LocomotionEvent::CameraTilt(_)
            | LocomotionEvent::WallRunStopped
            | LocomotionEvent::StanceChanged(_) => {}
        }
    }
}

/// A player in the game.
pub struct Player {
    /// Unique player ID.
    pub id: EntityId,

    /// Player name/handle.
    pub name: String,

    /// Shared with the controller, which deals fall damage through it.
    pub health: SharedHealth,

    pub stats: PlayerStats,

    /// Tilt offset applied on top of the look angles.
    pub camera: CameraTilt,

    /// Frame at which a dead player comes back.
    pub respawn_frame: Option<u64>,

    controller: LocomotionController,
    input: InputQueue,
    snapshot: LocomotionSnapshot,
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("health", &self.health.get().current())
            .field("position", &self.snapshot.position)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Create a new player at the given spawn point.
    pub fn new(
        id: EntityId,
        name: String,
        config: &LocomotionConfig,
        max_health: f32,
        spawn: &SpawnPoint,
        world: &dyn PhysicsQuery,
    ) -> Result<Self, ConfigError> {
        let health = SharedHealth::new(max_health);
        let input = InputQueue::new();
        let controller = spawn_controller(config, &health, &input, spawn, world)?;
        let snapshot = controller.snapshot();

        Ok(Self {
            id,
            name,
            health,
            stats: PlayerStats::default(),
            camera: CameraTilt::new(),
            respawn_frame: None,
            controller,
            input,
            snapshot,
        })
    }

    /// Get the player's current position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.snapshot.position
    }

    /// Get the player's eye position (for camera).
    pub fn eye_position(&self) -> Vec3 {
        self.snapshot.position + Vec3::Y * self.snapshot.eye_height
    }

    /// State published by the last tick.
    #[inline]
    pub fn snapshot(&self) -> &LocomotionSnapshot {
        &self.snapshot
    }

    #[inline]
    pub fn controller(&self) -> &LocomotionController {
        &self.controller
    }

    #[inline]
    pub fn controller_mut(&mut self) -> &mut LocomotionController {
        &mut self.controller
    }

    /// Check if the player is alive.
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.snapshot.is_dead && self.health.get().is_alive()
    }

    /// Check if the player is on the ground.
    #[inline]
    pub fn on_ground(&self) -> bool {
        self.snapshot.is_grounded
    }

    /// Feed `command` to the controller and advance it one tick.
    pub fn tick(&mut self, command: PlayerCommand, world: &dyn PhysicsQuery, delta_time: f32) -> TickReport {
        self.input.push(command);
        let report = self.controller.tick(world, delta_time);

        for event in &report.events {
            self.stats.record(event);
        }
        self.camera.handle_events(&report.events);
        self.camera.update(delta_time);
        self.snapshot = report.snapshot;
        report
    }

    /// Respawn the player at a spawn point with full health.
    pub fn respawn(
        &mut self,
        config: &LocomotionConfig,
        spawn: &SpawnPoint,
        world: &dyn PhysicsQuery,
    ) -> Result<(), ConfigError> {
        // Revive first, or the new controller would subscribe to a corpse
        self.health.get_mut().revive();
        self.input.clear();
        self.camera = CameraTilt::new();

        self.controller = spawn_controller(config, &self.health, &self.input, spawn, world)?;
        self.snapshot = self.controller.snapshot();
        self.respawn_frame = None;

        log::info!("player {} respawned at {:?}", self.id, spawn.position);
        Ok(())
    }
}

fn spawn_controller(
    config: &LocomotionConfig,
    health: &SharedHealth,
    input: &InputQueue,
    spawn: &SpawnPoint,
    world: &dyn PhysicsQuery,
) -> Result<LocomotionController, ConfigError> {
    let mut controller = LocomotionController::builder(config.clone())
        .input(input.clone())
        .health(health.clone())
        .spawn_at(spawn.position)
        .facing(spawn.facing)
        .build()?;

    if !controller.snap_to_ground(world) {
        log::warn!("no ground below spawn point {:?}", spawn.position);
    }
    Ok(controller)
}
