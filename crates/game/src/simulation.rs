//! Game simulation - the main game loop.
//!
//! This module steps every player's locomotion controller at a fixed rate,
//! applies level triggers, and respawns the dead.

use glam::Vec3;
use momentum_physics::{ConfigError, DamageSource, HealthService, LocomotionConfig, LocomotionEvent, TickReport};
use serde::{Deserialize, Serialize};

use crate::input::PlayerInput;
use crate::level::{Level, SpawnPoint, TriggerAction};
use crate::player::{EntityId, Player};

/// Game simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    /// Locomotion tunables shared by every player.
    pub locomotion: LocomotionConfig,

    /// Mouse sensitivity.
    pub look_sensitivity: f32,

    /// Seconds a dead player waits before respawning.
    pub respawn_delay: f32,

    pub max_health: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            locomotion: LocomotionConfig::default(),
            look_sensitivity: 2.0,
            respawn_delay: 2.0,
            max_health: 100.0,
        }
    }
}

impl SimulationConfig {
    /// Default simulation settings with the arcade locomotion preset.
    pub fn arcade() -> Self {
        log::info!("using arcade locomotion preset");
        Self {
            locomotion: LocomotionConfig::arcade(),
            ..Default::default()
        }
    }

    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Ticks a dead player waits before respawning.
    pub fn respawn_ticks(&self) -> u64 {
        (self.respawn_delay * self.tick_rate as f32).ceil() as u64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(invalid("tick_rate", "must be positive"));
        }
        if self.respawn_delay.is_nan() || self.respawn_delay < 0.0 {
            return Err(invalid("respawn_delay", "must not be negative"));
        }
        if self.max_health.is_nan() || self.max_health <= 0.0 {
            return Err(invalid("max_health", "must be positive"));
        }
        self.locomotion.validate()
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidTunable {
        name,
        reason: reason.to_string(),
    }
}

/// The main game simulation.
///
/// This contains all game state and advances it deterministically based on
/// player inputs.
#[derive(Debug)]
pub struct Simulation {
    /// Current frame/tick number.
    pub frame: u64,

    /// Simulation configuration.
    pub config: SimulationConfig,

    /// Current level.
    pub level: Level,

    /// All players in the game.
    pub players: Vec<Player>,

    /// Next entity ID to assign.
    next_entity_id: EntityId,
}

impl Simulation {
    /// Create a new simulation with the given configuration and level.
    pub fn new(config: SimulationConfig, level: Level) -> Result<Self, ConfigError> {
        config.validate()?;

        log::debug!("simulation on '{}' at {} Hz", level.name, config.tick_rate);
        Ok(Self {
            frame: 0,
            config,
            level,
            players: Vec::new(),
            next_entity_id: 1,
        })
    }

    /// Create a simulation with default configuration and the test course.
    pub fn test_course() -> Result<Self, ConfigError> {
        Self::new(SimulationConfig::default(), Level::test_course())
    }

    /// Add a player at the next spawn point.
    ///
    /// Returns the player's ID.
    pub fn add_player(&mut self, name: &str) -> Result<EntityId, ConfigError> {
        let spawn = self.next_spawn();
        self.spawn_player(name, &spawn)
    }

    /// Add a player at a specific spawn point.
    pub fn spawn_player(&mut self, name: &str, spawn: &SpawnPoint) -> Result<EntityId, ConfigError> {
        let id = self.next_entity_id;

        let player = Player::new(
            id,
            name.to_string(),
            &self.config.locomotion,
            self.config.max_health,
            spawn,
            &self.level.collision,
        )?;

        self.next_entity_id += 1;
        self.players.push(player);
        log::info!("player {id} '{name}' joined at {:?}", spawn.position);
        Ok(id)
    }

    /// Remove a player from the simulation.
    pub fn remove_player(&mut self, player_id: EntityId) {
        self.players.retain(|p| p.id != player_id);
    }

    /// Get a player by ID.
    pub fn get_player(&self, player_id: EntityId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Get a mutable reference to a player by ID.
    pub fn get_player_mut(&mut self, player_id: EntityId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Advance the simulation by one tick.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Player inputs indexed by player position in the `players` array
    ///
    /// Returns each player's tick report, in the same order.
    pub fn tick(&mut self, inputs: &[PlayerInput]) -> Vec<(EntityId, TickReport)> {
        let delta_time = self.config.delta_time();
        let spawn_count = self.level.player_spawn_count();
        let mut reports = Vec::with_capacity(self.players.len());

        for (i, player) in self.players.iter_mut().enumerate() {
            if player.respawn_frame.is_some_and(|frame| self.frame >= frame) {
                let spawn = self
                    .level
                    .get_player_spawn(i % spawn_count.max(1))
                    .copied()
                    .unwrap_or(DEFAULT_SPAWN);
                if let Err(e) = player.respawn(&self.config.locomotion, &spawn, &self.level.collision) {
                    log::error!("player {} failed to respawn: {e}", player.id);
                }
            }

            // Get input for this player (default if not provided)
            let input = inputs.get(i).cloned().unwrap_or_default();
            let command = input.to_command(self.config.look_sensitivity);

            let report = player.tick(command, &self.level.collision, delta_time);
            for event in &report.events {
                log_event(player.id, event);
            }

            if report.snapshot.is_dead {
                if player.respawn_frame.is_none() {
                    player.respawn_frame = Some(self.frame + self.config.respawn_ticks());
                }
            } else {
                let mut tow = None;
                for (trigger_id, action) in self.level.check_triggers(player.position()) {
                    log::debug!("player {} triggered: {}", player.id, trigger_id);
                    match action {
                        TriggerAction::Hurt { amount } => {
                            player.health.take_damage(amount, DamageSource::External);
                        }
                        TriggerAction::Tow { velocity } => tow = Some(velocity),
                    }
                }
                player.controller_mut().set_external_velocity(tow);
            }

            reports.push((player.id, report));
        }

        self.frame += 1;
        reports
    }

    /// Get the delta time for this simulation.
    pub fn delta_time(&self) -> f32 {
        self.config.delta_time()
    }

    fn next_spawn(&self) -> SpawnPoint {
        let spawn_index = self.players.len() % self.level.player_spawn_count().max(1);
        self.level
            .get_player_spawn(spawn_index)
            .copied()
            .unwrap_or(DEFAULT_SPAWN)
    }
}

const DEFAULT_SPAWN: SpawnPoint = SpawnPoint {
    position: Vec3::ZERO,
    facing: 0.0,
};

fn log_event(player: EntityId, event: &LocomotionEvent) {
    match event {
        LocomotionEvent::Footstep | LocomotionEvent::CameraTilt(_) => {
            log::trace!("player {player}: {event:?}")
        }
        LocomotionEvent::FallDamage { amount } => log::info!("player {player} took {amount:.1} fall damage"),
        LocomotionEvent::Died => log::info!("player {player} died"),
        _ => log::debug!("player {player}: {event:?}"),
    }
}

// ============================================================================
// Tests
// ============================================================================
