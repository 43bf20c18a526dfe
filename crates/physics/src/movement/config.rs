//! Locomotion tunables.
//!
//! All movement parameters are grouped here for easy tuning. Distances are
//! meters, times are seconds, speeds are meters/second and every angle in
//! this struct is in degrees.

use serde::{Deserialize, Serialize};

use crate::collision::ContentFlags;

use super::error::ConfigError;

/// Largest delta time a single tick will integrate.
pub const MAX_DELTA_TIME: f32 = 0.066;

/// Ground probe distance used while airborne.
pub const GROUND_CHECK_DISTANCE_IN_AIR: f32 = 0.07;

/// Time after a jump during which ground is not detected.
pub const JUMP_GROUNDING_PREVENTION_TIME: f32 = 0.2;

/// Pitch limit for the view (degrees).
pub const PITCH_LIMIT_DEGREES: f32 = 89.0;

/// Configuration for the locomotion controller.
///
/// Validated once when the controller is built and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    // ========================================================================
    // General
    // ========================================================================
    /// Downward acceleration applied while airborne.
    pub gravity_down_force: f32,

    /// Layers the ground probe considers.
    pub ground_check_layers: ContentFlags,

    /// Extra probe distance while already grounded.
    pub ground_check_distance: f32,

    /// Steepest walkable surface.
    pub slope_limit: f32,

    /// Tolerance margin for the grounded probe and the snap threshold.
    pub skin_width: f32,

    // ========================================================================
    // Movement
    // ========================================================================
    pub max_speed_on_ground: f32,

    /// Higher values reach the target ground velocity faster.
    pub movement_sharpness_on_ground: f32,

    /// Fraction of ground speed kept while crouching.
    pub max_speed_crouched_ratio: f32,

    pub max_speed_in_air: f32,

    pub acceleration_speed_in_air: f32,

    pub sprint_speed_modifier: f32,

    /// Falling below this height kills the player.
    pub kill_height: f32,

    // ========================================================================
    // Sliding
    // ========================================================================
    pub slide_speed_decay_rate: f32,

    /// Initial speed modifier of a slide.
    pub slide_speed: f32,

    pub sliding_tilt_time: f32,

    pub sliding_tilt_angle: f32,

    /// Speed modifier while sliding down a slope.
    pub slope_slide_speed_modifier: f32,

    /// Ground angle from which crouching turns into a slope slide.
    pub slope_angle: f32,

    // ========================================================================
    // Wall running
    // ========================================================================
    /// Layers the wall probe considers.
    pub wall_run_layers: ContentFlags,

    pub wall_run_tilt_time: f32,

    pub wall_run_tilt_angle: f32,

    /// Reach of the lateral wall rays.
    pub wall_run_trigger_distance: f32,

    /// Speed along the wall needed to start a run.
    pub wall_run_min_trigger_speed: f32,

    /// Speed along the run direction below which a run ends.
    pub wall_run_min_sustain_speed: f32,

    pub wall_run_cooldown: f32,

    pub jump_from_wall_force: f32,

    /// Fraction of gravity applied while running on a wall.
    pub wall_run_gravity_modifier: f32,

    // ========================================================================
    // Rotation
    // ========================================================================
    /// Degrees of rotation per unit of look input.
    pub rotation_speed: f32,

    /// Look multiplier while aiming.
    pub aiming_rotation_multiplier: f32,

    // ========================================================================
    // Jump
    // ========================================================================
    pub jump_force: f32,

    // ========================================================================
    // Stance
    // ========================================================================
    /// Eye height as a fraction of the capsule height.
    pub camera_height_ratio: f32,

    pub capsule_radius: f32,

    pub capsule_height_standing: f32,

    pub capsule_height_crouching: f32,

    /// Speed of the height transition between stances.
    pub crouching_sharpness: f32,

    // ========================================================================
    // Audio cues
    // ========================================================================
    /// Footsteps per meter walked.
    pub footstep_frequency: f32,

    /// Footsteps per meter while sprinting.
    pub footstep_frequency_while_sprinting: f32,

    // ========================================================================
    // Fall damage
    // ========================================================================
    pub receives_fall_damage: bool,

    /// Fall speed at which damage starts.
    pub min_speed_for_fall_damage: f32,

    /// Fall speed at which damage is maximal.
    pub max_speed_for_fall_damage: f32,

    pub fall_damage_at_min_speed: f32,

    pub fall_damage_at_max_speed: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            // General
            gravity_down_force: 25.0,
            ground_check_layers: ContentFlags::MASK_PLAYER_SOLID,
            ground_check_distance: 0.05,
            slope_limit: 45.0,
            skin_width: 0.08,

            // Movement
            max_speed_on_ground: 13.0,
            movement_sharpness_on_ground: 15.0,
            max_speed_crouched_ratio: 0.5,
            max_speed_in_air: 20.0,
            acceleration_speed_in_air: 25.0,
            sprint_speed_modifier: 2.0,
            kill_height: -50.0,

            // Sliding
            slide_speed_decay_rate: 6.0,
            slide_speed: 3.0,
            sliding_tilt_time: 0.3,
            sliding_tilt_angle: 12.5,
            slope_slide_speed_modifier: 2.0,
            slope_angle: 20.0,

            // Wall running
            wall_run_layers: ContentFlags::MASK_PLAYER_SOLID,
            wall_run_tilt_time: 0.3,
            wall_run_tilt_angle: 12.5,
            wall_run_trigger_distance: 1.0,
            wall_run_min_trigger_speed: 8.0,
            wall_run_min_sustain_speed: 3.0,
            wall_run_cooldown: 0.2,
            jump_from_wall_force: 10.0,
            wall_run_gravity_modifier: 0.5,

            // Rotation
            rotation_speed: 200.0,
            aiming_rotation_multiplier: 0.4,

            // Jump
            jump_force: 12.0,

            // Stance
            camera_height_ratio: 0.9,
            capsule_radius: 0.35,
            capsule_height_standing: 1.8,
            capsule_height_crouching: 0.9,
            crouching_sharpness: 10.0,

            // Audio cues
            footstep_frequency: 1.0,
            footstep_frequency_while_sprinting: 1.0,

            // Fall damage
            receives_fall_damage: true,
            min_speed_for_fall_damage: 10.0,
            max_speed_for_fall_damage: 30.0,
            fall_damage_at_min_speed: 10.0,
            fall_damage_at_max_speed: 50.0,
        }
    }
}

impl LocomotionConfig {
    /// A faster, more forgiving tuning with no fall damage.
    pub fn arcade() -> Self {
        Self {
            gravity_down_force: 30.0,
            max_speed_on_ground: 16.0,
            movement_sharpness_on_ground: 20.0,
            max_speed_in_air: 24.0,
            acceleration_speed_in_air: 40.0,
            sprint_speed_modifier: 1.5,
            wall_run_min_trigger_speed: 6.0,
            wall_run_gravity_modifier: 0.3,
            wall_run_cooldown: 0.1,
            jump_force: 14.0,
            jump_from_wall_force: 12.0,
            receives_fall_damage: false,
            ..Default::default()
        }
    }

    /// Check every tunable for values the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.capsule_radius > 0.0, "capsule_radius", "must be positive")?;
        ensure(
            self.capsule_height_crouching >= self.capsule_radius * 2.0,
            "capsule_height_crouching",
            "must fit both capsule caps",
        )?;
        ensure(
            self.capsule_height_crouching <= self.capsule_height_standing,
            "capsule_height_crouching",
            "must not exceed capsule_height_standing",
        )?;
        ensure(
            self.slope_limit > 0.0 && self.slope_limit < 90.0,
            "slope_limit",
            "must be between 0 and 90 degrees",
        )?;
        ensure(
            self.slope_angle >= 0.0 && self.slope_angle <= self.slope_limit,
            "slope_angle",
            "must be between 0 and slope_limit",
        )?;
        ensure(self.skin_width >= 0.0, "skin_width", "must not be negative")?;
        ensure(self.ground_check_distance >= 0.0, "ground_check_distance", "must not be negative")?;
        ensure(self.gravity_down_force >= 0.0, "gravity_down_force", "must not be negative")?;
        ensure(
            self.movement_sharpness_on_ground >= 0.0,
            "movement_sharpness_on_ground",
            "must not be negative",
        )?;
        ensure(self.crouching_sharpness >= 0.0, "crouching_sharpness", "must not be negative")?;
        ensure(
            self.wall_run_trigger_distance > 0.0,
            "wall_run_trigger_distance",
            "must be positive",
        )?;
        ensure(self.footstep_frequency > 0.0, "footstep_frequency", "must be positive")?;
        ensure(
            self.footstep_frequency_while_sprinting > 0.0,
            "footstep_frequency_while_sprinting",
            "must be positive",
        )?;
        ensure(
            self.max_speed_for_fall_damage > self.min_speed_for_fall_damage,
            "max_speed_for_fall_damage",
            "must be greater than min_speed_for_fall_damage",
        )?;
        Ok(())
    }

    /// Distance between footstep cues.
    pub fn footstep_interval(&self, sprinting: bool) -> f32 {
        let frequency = if sprinting {
            self.footstep_frequency_while_sprinting
        } else {
            self.footstep_frequency
        };
        1.0 / frequency
    }

    /// Eye height above the feet for a capsule of `height`.
    pub fn eye_height(&self, height: f32) -> f32 {
        height * self.camera_height_ratio
    }

    /// Damage for landing at `fall_speed`, or `None` when the landing is
    /// harmless or fall damage is disabled.
    pub fn fall_damage(&self, fall_speed: f32) -> Option<f32> {
        let ratio = (fall_speed - self.min_speed_for_fall_damage)
            / (self.max_speed_for_fall_damage - self.min_speed_for_fall_damage);
        if !self.receives_fall_damage || ratio <= 0.0 {
            return None;
        }

        let t = ratio.clamp(0.0, 1.0);
        Some(self.fall_damage_at_min_speed + (self.fall_damage_at_max_speed - self.fall_damage_at_min_speed) * t)
    }
}

fn ensure(condition: bool, name: &'static str, reason: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::InvalidTunable {
            name,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LocomotionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_speed_on_ground, 13.0);
        assert_eq!(config.jump_force, 12.0);
    }

    #[test]
    fn test_arcade_config_is_valid() {
        let config = LocomotionConfig::arcade();
        assert!(config.validate().is_ok());
        assert!(!config.receives_fall_damage);
    }

    #[test]
    fn test_crouch_taller_than_standing_is_rejected() {
        let config = LocomotionConfig {
            capsule_height_crouching: 2.0,
            ..Default::default()
        };

        match config.validate() {
            Err(ConfigError::InvalidTunable { name, .. }) => {
                assert_eq!(name, "capsule_height_crouching");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_fall_speed_range_must_be_increasing() {
        let config = LocomotionConfig {
            max_speed_for_fall_damage: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fall_damage_curve() {
        let config = LocomotionConfig::default();

        assert_eq!(config.fall_damage(5.0), None);
        assert_eq!(config.fall_damage(10.0), None);
        assert!((config.fall_damage(20.0).unwrap() - 30.0).abs() < 1e-4);
        // Clamped above the max speed
        assert_eq!(config.fall_damage(40.0), Some(50.0));

        let immune = LocomotionConfig {
            receives_fall_damage: false,
            ..Default::default()
        };
        assert_eq!(immune.fall_damage(40.0), None);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: LocomotionConfig =
            serde_json::from_str(r#"{ "jump_force": 9.0 }"#).unwrap();
        assert_eq!(config.jump_force, 9.0);
        assert_eq!(config.max_speed_on_ground, 13.0);
    }
}
