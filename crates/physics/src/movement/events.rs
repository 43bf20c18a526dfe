//! Cosmetic and gameplay notifications produced by a tick.
//!
//! Nothing in the locomotion core plays sounds or animates cameras. Each
//! tick returns a [`TickReport`] listing what happened, and the game decides
//! how to present it.

use serde::{Deserialize, Serialize};

use super::state::LocomotionSnapshot;

/// Stance shown on the HUD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HudStance {
    #[default]
    Standing,
    Sprinting,
    Crouching,
    Sliding,
    WallRun,
    Jumping,
}

/// Easing curve for camera tilts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    #[default]
    InOutCubic,
}

impl Easing {
    /// Map normalized time `t` in `[0, 1]` through the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Request to rotate the camera to a local orientation over time.
///
/// Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiltRequest {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub duration: f32,
    pub easing: Easing,
}

/// Something observable that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LocomotionEvent {
    CameraTilt(TiltRequest),
    Footstep,
    Jumped,
    /// Harmless landing.
    Landed,
    /// Landing hard enough to hurt.
    FallDamage { amount: f32 },
    WallRunStarted,
    WallRunStopped,
    StanceChanged(HudStance),
    Died,
}

/// Output of one controller tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub events: Vec<LocomotionEvent>,
    pub snapshot: LocomotionSnapshot,
}

impl TickReport {
    /// Check if an event matching `predicate` happened this tick.
    pub fn any(&self, predicate: impl Fn(&LocomotionEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_out_cubic_endpoints() {
        let easing = Easing::InOutCubic;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(1.0), 1.0);
        assert!((easing.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_in_out_cubic_is_slow_at_the_edges() {
        let easing = Easing::InOutCubic;
        assert!(easing.apply(0.1) < Easing::Linear.apply(0.1));
        assert!(easing.apply(0.9) > Easing::Linear.apply(0.9));
        // Out of range input is clamped
        assert_eq!(easing.apply(2.0), 1.0);
    }
}
