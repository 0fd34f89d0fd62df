//! Simulation clock for the Menagerie simulation.
//!
//! The clock is the single source of truth for time. It counts ticks and
//! accumulates simulated seconds from a fixed timestep; every timer in the
//! behavior layer is driven by the `dt` the clock hands out.
//!
//! # Design Principles
//!
//! - The tick counter uses checked arithmetic (no silent overflow).
//! - Elapsed time is derived from the tick count and the fixed timestep,
//!   never accumulated independently, so it cannot drift.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. a zero or negative timestep).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Fixed-step simulation clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    /// Current tick number (0 before the first tick).
    tick: u64,

    /// Seconds simulated per tick.
    fixed_dt: f32,
}

impl SimClock {
    /// Create a clock at tick 0 with the given timestep in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `fixed_dt` is not a positive
    /// finite number.
    pub fn new(fixed_dt: f32) -> Result<Self, ClockError> {
        Self::from_parts(0, fixed_dt)
    }

    /// Create a clock from explicit parameters (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `fixed_dt` is not a positive
    /// finite number.
    pub fn from_parts(tick: u64, fixed_dt: f32) -> Result<Self, ClockError> {
        if !fixed_dt.is_finite() || fixed_dt <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("fixed_dt must be positive, got {fixed_dt}"),
            });
        }
        Ok(Self { tick, fixed_dt })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Seconds per tick (the `DeltaTime` every behavior sees).
    pub const fn dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Simulated seconds since tick 0 (the `Now` every behavior sees).
    pub fn now(&self) -> f64 {
        self.tick as f64 * f64::from(self.fixed_dt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_tick_zero() {
        let clock = SimClock::new(0.1).unwrap();
        assert_eq!(clock.tick(), 0);
        assert!(clock.now().abs() < f64::EPSILON);
    }

    #[test]
    fn clock_advances() {
        let mut clock = SimClock::new(0.5).unwrap();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert!((clock.now() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_timestep_rejected() {
        assert!(SimClock::new(0.0).is_err());
        assert!(SimClock::new(-1.0).is_err());
        assert!(SimClock::new(f32::NAN).is_err());
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = SimClock::from_parts(u64::MAX, 0.1).unwrap();
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
    }
}
