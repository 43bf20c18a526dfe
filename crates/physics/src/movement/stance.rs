//! Stance state machine.
//!
//! Four mutually exclusive stances: Standing, Crouching, Sliding (a sprint
//! slide on level ground) and SlidingOnSlope. Holding crouch lowers the
//! player; releasing it stands up again once there is room.

use serde::{Deserialize, Serialize};

use super::config::LocomotionConfig;

/// Height within which the capsule snaps to its target.
const HEIGHT_SNAP_EPSILON: f32 = 1.0e-4;

/// The player's stance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
    Sliding,
    SlidingOnSlope,
}

impl Stance {
    /// Any stance other than standing.
    #[inline]
    pub fn is_lowered(self) -> bool {
        self != Stance::Standing
    }
}

/// Input for stance transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StanceInput {
    /// Crouch is held and not masked.
    pub crouch_requested: bool,
    /// Sprint is held.
    pub sprint_held: bool,
    pub grounded: bool,
    pub on_slope: bool,
}

/// Stance state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceState {
    stance: Stance,
    /// Capsule height the current stance wants.
    target_height: f32,
    /// When the current slide started.
    slide_started_at: f32,
    /// When the slide pitch should be applied, if pending.
    slide_pitch_deadline: Option<f32>,
    standing_height: f32,
    crouching_height: f32,
    slide_pitch_delay: f32,
}

impl StanceState {
    /// Create a standing state machine.
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            stance: Stance::Standing,
            target_height: config.capsule_height_standing,
            slide_started_at: 0.0,
            slide_pitch_deadline: None,
            standing_height: config.capsule_height_standing,
            crouching_height: config.capsule_height_crouching,
            slide_pitch_delay: (config.sliding_tilt_time - 1.0).max(0.0),
        }
    }

    #[inline]
    pub fn stance(&self) -> Stance {
        self.stance
    }

    #[inline]
    pub fn target_height(&self) -> f32 {
        self.target_height
    }

    #[inline]
    pub fn is_crouching(&self) -> bool {
        self.stance == Stance::Crouching
    }

    #[inline]
    pub fn is_sliding(&self) -> bool {
        self.stance == Stance::Sliding
    }

    #[inline]
    pub fn is_sliding_on_slope(&self) -> bool {
        self.stance == Stance::SlidingOnSlope
    }

    /// Seconds since the current slide started.
    pub fn slide_elapsed(&self, now: f32) -> f32 {
        now - self.slide_started_at
    }

    /// Evaluate transitions for this tick.
    ///
    /// `can_stand` is only called when the player needs to stand up from a
    /// lowered stance; returning `false` keeps the current stance. Returns
    /// `true` if the stance or the target height changed.
    #[must_use]
    pub fn evaluate(&mut self, input: StanceInput, can_stand: impl FnOnce() -> bool, now: f32) -> bool {
        let before = (self.stance, self.target_height);

        if input.crouch_requested && input.grounded {
            self.lower(input, now);
        } else if self.stance.is_lowered() {
            self.stand_up(can_stand);
        }

        let changed = before != (self.stance, self.target_height);
        if changed {
            log::debug!("stance: {:?} -> {:?} (target height {:.2})", before.0, self.stance, self.target_height);
        }
        changed
    }

    /// Stand up if there is room. Returns `false` if obstructed.
    ///
    /// Already standing always succeeds without calling `can_stand`.
    pub fn stand_up(&mut self, can_stand: impl FnOnce() -> bool) -> bool {
        if !self.stance.is_lowered() {
            return true;
        }
        if !can_stand() {
            log::info!("stand refused: obstructed while {:?}", self.stance);
            return false;
        }

        self.stance = Stance::Standing;
        self.target_height = self.standing_height;
        self.slide_started_at = 0.0;
        true
    }

    /// Force the standing stance, ignoring obstructions.
    pub fn reset(&mut self) {
        self.stance = Stance::Standing;
        self.target_height = self.standing_height;
        self.slide_started_at = 0.0;
        self.slide_pitch_deadline = None;
    }

    /// Check whether the deferred slide pitch is due, clearing it if so.
    pub fn take_due_slide_pitch(&mut self, now: f32) -> bool {
        match self.slide_pitch_deadline {
            Some(deadline) if now >= deadline => {
                self.slide_pitch_deadline = None;
                true
            }
            _ => false,
        }
    }

    fn lower(&mut self, input: StanceInput, now: f32) {
        if input.on_slope {
            self.stance = Stance::SlidingOnSlope;
            return;
        }
        if self.stance == Stance::SlidingOnSlope {
            self.stance = Stance::Standing;
        }

        self.target_height = self.crouching_height;
        match self.stance {
            Stance::Standing if input.sprint_held => {
                self.stance = Stance::Sliding;
                self.slide_started_at = now;
                self.slide_pitch_deadline = Some(now + self.slide_pitch_delay);
            }
            Stance::Standing => self.stance = Stance::Crouching,
            // A running slide or crouch continues while crouch is held
            Stance::Crouching | Stance::Sliding | Stance::SlidingOnSlope => {}
        }
    }
}

/// Move `current` toward `target` by `sharpness * dt` of the gap.
///
/// Snaps to `target` once within a small epsilon.
pub fn smooth_height(current: f32, target: f32, sharpness: f32, dt: f32) -> f32 {
    let t = (sharpness * dt).clamp(0.0, 1.0);
    let height = current + (target - current) * t;
    if (target - height).abs() < HEIGHT_SNAP_EPSILON {
        target
    } else {
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_state() -> StanceState {
        StanceState::new(&LocomotionConfig::default())
    }

    fn crouch() -> StanceInput {
        StanceInput {
            crouch_requested: true,
            grounded: true,
            ..Default::default()
        }
    }

    fn released() -> StanceInput {
        StanceInput {
            grounded: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_crouch_and_stand() {
        let mut state = create_state();

        assert!(state.evaluate(crouch(), || true, 0.0));
        assert!(state.is_crouching());
        assert_eq!(state.target_height(), 0.9);

        assert!(state.evaluate(released(), || true, 0.1));
        assert_eq!(state.stance(), Stance::Standing);
        assert_eq!(state.target_height(), 1.8);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut state = create_state();
        assert!(state.evaluate(crouch(), || true, 0.0));

        assert!(!state.evaluate(crouch(), || true, 0.0));
        assert!(!state.evaluate(crouch(), || true, 0.0));
        assert!(state.is_crouching());
    }

    #[test]
    fn test_sprint_crouch_starts_slide() {
        let mut state = create_state();
        let input = StanceInput {
            sprint_held: true,
            ..crouch()
        };

        assert!(state.evaluate(input, || true, 2.0));
        assert!(state.is_sliding());
        assert!(!state.is_crouching());
        assert!((state.slide_elapsed(2.5) - 0.5).abs() < 1e-6);

        // The slide keeps going while crouch stays held, sprint or not
        assert!(!state.evaluate(crouch(), || true, 3.0));
        assert!(state.is_sliding());
    }

    #[test]
    fn test_sprint_while_crouched_does_not_slide() {
        let mut state = create_state();
        assert!(state.evaluate(crouch(), || true, 0.0));

        let input = StanceInput {
            sprint_held: true,
            ..crouch()
        };
        assert!(!state.evaluate(input, || true, 0.5));
        assert!(state.is_crouching());
    }

    #[test]
    fn test_crouch_on_slope_slides_down_it() {
        let mut state = create_state();
        let input = StanceInput {
            on_slope: true,
            ..crouch()
        };

        assert!(state.evaluate(input, || true, 0.0));
        assert!(state.is_sliding_on_slope());
        assert!(!state.is_crouching());
        // Slope slide keeps the previous height target
        assert_eq!(state.target_height(), 1.8);

        // Back on level ground it becomes a crouch
        assert!(state.evaluate(crouch(), || true, 0.5));
        assert!(state.is_crouching());
        assert!(!state.is_sliding_on_slope());
    }

    #[test]
    fn test_stand_refused_when_obstructed() {
        let mut state = create_state();
        assert!(state.evaluate(crouch(), || true, 0.0));

        assert!(!state.evaluate(released(), || false, 0.1));
        assert!(state.is_crouching());
        assert_eq!(state.target_height(), 0.9);
    }

    #[test]
    fn test_standing_skips_obstruction_check() {
        let mut state = create_state();
        let mut checked = false;
        assert!(state.stand_up(|| {
            checked = true;
            false
        }));
        assert!(!checked);
    }

    #[test]
    fn test_leaving_ground_stands_up() {
        let mut state = create_state();
        assert!(state.evaluate(crouch(), || true, 0.0));

        let airborne = StanceInput {
            crouch_requested: true,
            grounded: false,
            ..Default::default()
        };
        assert!(state.evaluate(airborne, || true, 0.1));
        assert_eq!(state.stance(), Stance::Standing);
    }

    #[test]
    fn test_slide_pitch_deadline() {
        let mut state = create_state();
        let input = StanceInput {
            sprint_held: true,
            ..crouch()
        };
        assert!(state.evaluate(input, || true, 1.0));

        assert!(state.take_due_slide_pitch(1.0));
        assert!(!state.take_due_slide_pitch(2.0));
    }

    #[test]
    fn test_reset_forces_standing() {
        let mut state = create_state();
        assert!(state.evaluate(crouch(), || true, 0.0));

        state.reset();
        assert_eq!(state.stance(), Stance::Standing);
        assert_eq!(state.target_height(), 1.8);
    }

    #[test]
    fn test_height_rises_monotonically() {
        let mut height = 0.9;
        let mut steps = 0;
        while height < 1.8 {
            let next = smooth_height(height, 1.8, 10.0, 1.0 / 60.0);
            assert!(next > height);
            assert!(next <= 1.8);
            height = next;
            steps += 1;
            assert!(steps < 1000, "height never converged");
        }
        assert_eq!(height, 1.8);
    }
}
