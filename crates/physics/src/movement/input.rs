//! Input collaborator interface.

use super::state::PlayerCommand;

/// Source of player commands, polled once per tick.
pub trait InputProvider {
    fn poll(&mut self) -> PlayerCommand;
}

impl<F> InputProvider for F
where
    F: FnMut() -> PlayerCommand,
{
    fn poll(&mut self) -> PlayerCommand {
        self()
    }
}
