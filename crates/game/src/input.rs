//! Player input handling.
//!
//! This module converts raw input (keyboard, mouse) into commands for the
//! locomotion core, and queues them for the controller to poll.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec2;
use momentum_physics::{CommandButtons, InputProvider, PlayerCommand};
use serde::{Deserialize, Serialize};

/// Look units per pixel of mouse movement at sensitivity 1.
const PIXELS_TO_LOOK: f32 = 0.001;

/// Raw player input for a single frame.
///
/// This is the input format received from the client input system.
/// It gets converted to [`PlayerCommand`] for the locomotion core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Movement keys pressed.
    pub movement: MovementInput,

    /// Mouse delta this frame (pixels, y down).
    pub mouse_delta: (f32, f32),

    /// Action buttons pressed.
    pub actions: ActionInput,

    /// Frame number this input was generated.
    pub frame: u32,
}

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Action button states.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActionInput {
    pub fire: bool,
    pub aim: bool,
    pub jump: bool,
    pub crouch: bool,
    pub sprint: bool,
    pub use_item: bool,
}

impl PlayerInput {
    /// Convert to a locomotion command.
    ///
    /// # Arguments
    ///
    /// * `look_sensitivity` - Mouse sensitivity multiplier
    pub fn to_command(&self, look_sensitivity: f32) -> PlayerCommand {
        let mut cmd = PlayerCommand::default();

        // Movement axes
        if self.movement.forward {
            cmd.forward_move += 1.0;
        }
        if self.movement.backward {
            cmd.forward_move -= 1.0;
        }
        if self.movement.right {
            cmd.right_move += 1.0;
        }
        if self.movement.left {
            cmd.right_move -= 1.0;
        }

        // Normalize diagonal movement
        let move_magnitude = (cmd.forward_move.powi(2) + cmd.right_move.powi(2)).sqrt();
        if move_magnitude > 1.0 {
            cmd.forward_move /= move_magnitude;
            cmd.right_move /= move_magnitude;
        }

        // Moving the mouse up looks up
        let scale = look_sensitivity * PIXELS_TO_LOOK;
        cmd.look = Vec2::new(self.mouse_delta.0, -self.mouse_delta.1) * scale;

        // Action buttons
        let buttons = [
            (self.actions.fire, CommandButtons::FIRE),
            (self.actions.aim, CommandButtons::AIM),
            (self.actions.jump, CommandButtons::JUMP),
            (self.actions.crouch, CommandButtons::CROUCH),
            (self.actions.sprint, CommandButtons::SPRINT),
            (self.actions.use_item, CommandButtons::USE),
        ];
        for (held, button) in buttons {
            if held {
                cmd.buttons.press(button);
            }
        }

        cmd
    }

    /// Check if any movement input is active.
    pub fn has_movement(&self) -> bool {
        self.movement.forward || self.movement.backward || self.movement.left || self.movement.right
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<PlayerCommand>,
    last: PlayerCommand,
}

/// Commands waiting for a controller to poll them.
///
/// The game pushes, the controller polls. When the queue runs dry the last
/// command's keys stay held but the look input is not repeated. Clones share
/// the same queue.
#[derive(Debug, Clone, Default)]
pub struct InputQueue(Rc<RefCell<QueueState>>);

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: PlayerCommand) {
        self.0.borrow_mut().pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().pending.is_empty()
    }

    /// Drop everything queued and release all keys.
    pub fn clear(&self) {
        let mut state = self.0.borrow_mut();
        state.pending.clear();
        state.last = PlayerCommand::default();
    }
}

impl InputProvider for InputQueue {
    fn poll(&mut self) -> PlayerCommand {
        let mut state = self.0.borrow_mut();
        match state.pending.pop_front() {
            Some(command) => {
                state.last = command;
                command
            }
            None => PlayerCommand {
                look: Vec2::ZERO,
                ..state.last
            },
        }
    }
}
