//! Player health.
//!
//! [`Health`] is the game's side of the [`HealthService`] contract: it takes
//! damage from the locomotion core and from the level, and fires every
//! subscribed [`DeathSignal`] when it reaches zero.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use momentum_physics::{DamageSource, DeathSignal, HealthService, SubscriptionId};

/// Hit points and death subscribers for one player.
#[derive(Debug)]
pub struct Health {
    current: f32,
    max: f32,
    subscribers: Vec<(SubscriptionId, DeathSignal)>,
    next_subscription: u64,
    deaths: u32,
    /// Damage taken since the last revive, per source.
    fall_damage: f32,
    external_damage: f32,
}

impl Health {
    /// Create full health.
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            subscribers: Vec::new(),
            next_subscription: 1,
            deaths: 0,
            fall_damage: 0.0,
            external_damage: 0.0,
        }
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Times this health has reached zero.
    #[inline]
    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Fall damage taken since the last revive.
    #[inline]
    pub fn fall_damage(&self) -> f32 {
        self.fall_damage
    }

    /// Damage from anything but falls since the last revive.
    #[inline]
    pub fn external_damage(&self) -> f32 {
        self.external_damage
    }

    /// Number of live death subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Heal the player.
    ///
    /// Returns the actual health restored. The dead cannot be healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }

        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }

    /// Restore full health after a death.
    pub fn revive(&mut self) {
        self.current = self.max;
        self.fall_damage = 0.0;
        self.external_damage = 0.0;
    }

    fn die(&mut self) {
        self.current = 0.0;
        self.deaths += 1;
        for (_, signal) in &self.subscribers {
            signal.fire();
        }
        log::info!("health depleted ({} subscribers notified)", self.subscribers.len());
    }
}

impl HealthService for Health {
    fn take_damage(&mut self, amount: f32, source: DamageSource) {
        if !self.is_alive() || amount <= 0.0 {
            return;
        }

        match source {
            DamageSource::Fall => self.fall_damage += amount,
            DamageSource::External | DamageSource::OutOfBounds => self.external_damage += amount,
        }

        self.current = (self.current - amount).max(0.0);
        log::debug!("took {amount:.1} {source:?} damage, {:.1} left", self.current);

        if self.current <= 0.0 {
            self.die();
        }
    }

    fn kill(&mut self) {
        if self.is_alive() {
            self.die();
        }
    }

    fn subscribe_death(&mut self, signal: DeathSignal) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        // Subscribing to the already dead is an immediate death
        if !self.is_alive() {
            signal.fire();
        }
        self.subscribers.push((id, signal));
        id
    }

    fn unsubscribe_death(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(subscribed, _)| *subscribed != id);
    }
}

/// Shared handle to a [`Health`].
///
/// The locomotion controller owns its health collaborator, while the game
/// also needs to read it and apply level damage. Clones refer to the same
/// health.
#[derive(Debug, Clone)]
pub struct SharedHealth(Rc<RefCell<Health>>);

impl SharedHealth {
    pub fn new(max: f32) -> Self {
        Self(Rc::new(RefCell::new(Health::new(max))))
    }

    pub fn get(&self) -> Ref<'_, Health> {
        self.0.borrow()
    }

    pub fn get_mut(&self) -> RefMut<'_, Health> {
        self.0.borrow_mut()
    }
}

impl HealthService for SharedHealth {
    fn take_damage(&mut self, amount: f32, source: DamageSource) {
        self.0.borrow_mut().take_damage(amount, source);
    }

    fn kill(&mut self) {
        self.0.borrow_mut().kill();
    }

    fn subscribe_death(&mut self, signal: DeathSignal) -> SubscriptionId {
        self.0.borrow_mut().subscribe_death(signal)
    }

    fn unsubscribe_death(&mut self, id: SubscriptionId) {
        self.0.borrow_mut().unsubscribe_death(id);
    }
}
