//! Health collaborator interface.
//!
//! The controller deals fall damage and forces deaths through a
//! [`HealthService`], and learns about deaths caused elsewhere through a
//! [`DeathSignal`] it subscribes at build time.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// What caused a damage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// Landing too hard.
    Fall,
    /// Falling out of the world.
    OutOfBounds,
    /// Anything outside the locomotion core.
    External,
}

/// Handle returned by [`HealthService::subscribe_death`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// One-shot death latch shared between a health service and its listener.
///
/// Clones observe the same latch. Firing succeeds only once.
#[derive(Debug, Clone, Default)]
pub struct DeathSignal {
    fired: Rc<Cell<bool>>,
}

impl DeathSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the signal. Returns `true` only for the call that latched it.
    pub fn fire(&self) -> bool {
        !self.fired.replace(true)
    }

    /// Check if the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.fired.get()
    }
}

/// The player's health, as seen by the locomotion core.
pub trait HealthService {
    /// Apply `amount` damage.
    fn take_damage(&mut self, amount: f32, source: DamageSource);

    /// Kill immediately.
    fn kill(&mut self);

    /// Register `signal` to be fired when the owner dies.
    fn subscribe_death(&mut self, signal: DeathSignal) -> SubscriptionId;

    /// Stop notifying a previously subscribed signal.
    fn unsubscribe_death(&mut self, id: SubscriptionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_death_signal_fires_once() {
        let signal = DeathSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_fired());

        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(observer.is_fired());
    }
}
