//! Body state, movement flags and input structures.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision::Capsule;

use super::events::HudStance;

/// World up direction.
pub const UP: Vec3 = Vec3::Y;

/// Flags describing the player's current movement state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFlags(pub u16);

impl MovementFlags {
    /// Player is touching walkable ground.
    pub const ON_GROUND: u16 = 1 << 0;

    /// Ground under the player is at least the slope angle.
    pub const ON_SLOPE: u16 = 1 << 1;

    /// Player is crouching.
    pub const CROUCHING: u16 = 1 << 2;

    /// Player is in a sprint slide.
    pub const SLIDING: u16 = 1 << 3;

    /// Player is sliding down a slope.
    pub const SLIDING_ON_SLOPE: u16 = 1 << 4;

    /// Player is sprinting.
    pub const SPRINTING: u16 = 1 << 5;

    /// Jump was pressed this tick.
    pub const JUMPING: u16 = 1 << 6;

    /// A jump impulse was applied this tick.
    pub const JUMPED_THIS_TICK: u16 = 1 << 7;

    /// Player is running along a wall.
    pub const WALL_RUNNING: u16 = 1 << 8;

    /// Velocity is supplied externally (grapple).
    pub const TOWED: u16 = 1 << 9;

    /// Player is dead.
    pub const DEAD: u16 = 1 << 10;

    /// Check if a flag is set.
    #[inline]
    pub fn has(self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set(&mut self, flag: u16, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    #[inline]
    pub fn on_ground(self) -> bool {
        self.has(Self::ON_GROUND)
    }

    #[inline]
    pub fn sprinting(self) -> bool {
        self.has(Self::SPRINTING)
    }

    #[inline]
    pub fn wall_running(self) -> bool {
        self.has(Self::WALL_RUNNING)
    }

    #[inline]
    pub fn towed(self) -> bool {
        self.has(Self::TOWED)
    }

    #[inline]
    pub fn dead(self) -> bool {
        self.has(Self::DEAD)
    }
}

/// The simulated body: a vertical capsule standing on `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicBody {
    /// Feet position (bottom-center of the capsule).
    pub position: Vec3,

    /// Velocity in world space (meters/second).
    pub velocity: Vec3,

    /// Horizontal view angle in radians, wrapped to (-PI, PI].
    pub yaw: f32,

    /// Vertical view angle in radians. Positive looks down.
    pub pitch: f32,

    /// Capsule radius.
    pub radius: f32,

    /// Current capsule height.
    pub height: f32,

    /// Height the capsule is converging toward.
    pub target_height: f32,
}

impl KinematicBody {
    /// Create a standing body at `position`.
    pub fn new(position: Vec3, radius: f32, height: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            radius,
            height,
            target_height: height,
        }
    }

    /// The body capsule at its current height.
    pub fn capsule(&self) -> Capsule {
        self.capsule_with_height(self.height)
    }

    /// The body capsule as it would be at `height`.
    pub fn capsule_with_height(&self, height: f32) -> Capsule {
        Capsule::upright(self.position, UP, height, self.radius)
    }

    /// Middle of the capsule; wall probes start here.
    pub fn center(&self) -> Vec3 {
        self.position + UP * (self.height * 0.5)
    }

    /// Horizontal forward direction from yaw.
    pub fn forward_direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(cos_yaw, 0.0, sin_yaw)
    }

    /// Horizontal right direction from yaw.
    pub fn right_direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(-sin_yaw, 0.0, cos_yaw)
    }

    /// Convert a body-local move vector (x = right, z = forward) to world space.
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.right_direction() * local.x + self.forward_direction() * local.z
    }

    /// Velocity with the vertical component removed.
    pub fn horizontal_velocity(&self) -> Vec3 {
        self.velocity.reject_from_normalized(UP)
    }
}

/// Result of the ground probe for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundInfo {
    pub is_grounded: bool,

    /// Normal of the supporting surface, or up when there is none.
    pub normal: Vec3,

    /// Distance to whatever the probe hit, or infinity.
    pub distance_to_ground: f32,

    /// Ground is at least as steep as the slope angle.
    pub is_on_slope: bool,
}

impl Default for GroundInfo {
    fn default() -> Self {
        Self::airborne()
    }
}

impl GroundInfo {
    /// Nothing under the body.
    pub fn airborne() -> Self {
        Self {
            is_grounded: false,
            normal: UP,
            distance_to_ground: f32::INFINITY,
            is_on_slope: false,
        }
    }
}

/// Input command from the player for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerCommand {
    /// Forward/backward movement (-1.0 to 1.0).
    pub forward_move: f32,

    /// Strafe left/right (-1.0 to 1.0).
    pub right_move: f32,

    /// Look input this tick: x turns, y pitches.
    ///
    /// Scaled by the configured rotation speed, so one unit is
    /// `rotation_speed` degrees.
    pub look: Vec2,

    /// Held buttons.
    pub buttons: CommandButtons,
}

/// Button state flags for player commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandButtons(pub u16);

impl CommandButtons {
    /// Primary fire button.
    pub const FIRE: u16 = 1 << 0;

    /// Aim down sights.
    pub const AIM: u16 = 1 << 1;

    pub const JUMP: u16 = 1 << 2;

    pub const CROUCH: u16 = 1 << 3;

    pub const SPRINT: u16 = 1 << 4;

    /// Use/interact button.
    pub const USE: u16 = 1 << 5;

    /// Check if a button is pressed.
    #[inline]
    pub fn pressed(self, button: u16) -> bool {
        (self.0 & button) != 0
    }

    /// Press a button.
    #[inline]
    pub fn press(&mut self, button: u16) {
        self.0 |= button;
    }

    /// Release a button.
    #[inline]
    pub fn release(&mut self, button: u16) {
        self.0 &= !button;
    }
}

impl PlayerCommand {
    #[inline]
    pub fn wants_jump(&self) -> bool {
        self.buttons.pressed(CommandButtons::JUMP)
    }

    #[inline]
    pub fn wants_crouch(&self) -> bool {
        self.buttons.pressed(CommandButtons::CROUCH)
    }

    #[inline]
    pub fn wants_sprint(&self) -> bool {
        self.buttons.pressed(CommandButtons::SPRINT)
    }

    #[inline]
    pub fn wants_aim(&self) -> bool {
        self.buttons.pressed(CommandButtons::AIM)
    }

    /// Body-local move vector (x = right, z = forward), at most unit length.
    pub fn movement_input(&self) -> Vec3 {
        Vec3::new(self.right_move, 0.0, self.forward_move).clamp_length_max(1.0)
    }
}

/// Observable locomotion state, published after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocomotionSnapshot {
    pub is_grounded: bool,
    pub is_crouching: bool,
    pub is_sliding: bool,
    pub is_sliding_on_slope: bool,
    pub is_sprinting: bool,
    pub is_wall_running: bool,
    pub is_jumping: bool,
    pub is_dead: bool,
    pub velocity: Vec3,
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub height: f32,
    pub eye_height: f32,
    pub hud_stance: HudStance,
}
