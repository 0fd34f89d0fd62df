//! The need model: hunger and sleepiness.
//!
//! Both needs live in `[0, 100]` and only grow with time. Growth is the one
//! place they increase; satisfying actions are the only way they go down:
//!
//! - [`Recovery::Full`] sets the need to exactly 0 (proper food, proper bed)
//! - [`Recovery::Partial`] subtracts a fixed amount, floored at 0 (forced
//!   or improper rest)
//!
//! Sleepiness does not accumulate while the pet is asleep.

use crate::config::NeedsConfig;

/// Upper bound of every need.
pub const NEED_MAX: f32 = 100.0;

/// Which need a satisfy event applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeedKind {
    /// Hunger.
    Hunger,
    /// Sleepiness.
    Sleepiness,
}

/// How much of a need a satisfying action removes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recovery {
    /// Reset the need to 0.
    Full,
    /// Subtract this amount, flooring at 0.
    Partial(f32),
}

/// Per-pet need state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Needs {
    hunger: f32,
    sleepiness: f32,
}

impl Needs {
    /// Create need state, clamping both values into range.
    pub const fn new(hunger: f32, sleepiness: f32) -> Self {
        Self {
            hunger: hunger.clamp(0.0, NEED_MAX),
            sleepiness: sleepiness.clamp(0.0, NEED_MAX),
        }
    }

    /// Current hunger.
    pub const fn hunger(&self) -> f32 {
        self.hunger
    }

    /// Current sleepiness.
    pub const fn sleepiness(&self) -> f32 {
        self.sleepiness
    }

    /// Current value of `kind`.
    pub const fn get(&self, kind: NeedKind) -> f32 {
        match kind {
            NeedKind::Hunger => self.hunger,
            NeedKind::Sleepiness => self.sleepiness,
        }
    }

    /// Overwrite `kind`, clamped into range.
    pub const fn set(&mut self, kind: NeedKind, value: f32) {
        let value = value.clamp(0.0, NEED_MAX);
        match kind {
            NeedKind::Hunger => self.hunger = value,
            NeedKind::Sleepiness => self.sleepiness = value,
        }
    }

    /// Grow both needs by `dt` seconds of their configured rates.
    pub fn tick(&mut self, dt: f32, config: &NeedsConfig, asleep: bool) {
        let dt = dt.max(0.0);
        self.hunger = config.hunger_rate.mul_add(dt, self.hunger).clamp(0.0, NEED_MAX);
        if !asleep {
            self.sleepiness = config
                .sleepiness_rate
                .mul_add(dt, self.sleepiness)
                .clamp(0.0, NEED_MAX);
        }
    }

    /// Apply a satisfying action to `kind`.
    pub fn satisfy(&mut self, kind: NeedKind, recovery: Recovery) {
        let current = self.get(kind);
        let next = match recovery {
            Recovery::Full => 0.0,
            Recovery::Partial(amount) => (current - amount.max(0.0)).max(0.0),
        };
        self.set(kind, next);
    }
}

impl Default for Needs {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
