//! Core value structs: pet identity and locomotion parameters.

use serde::{Deserialize, Serialize};

use crate::diet::DietFlags;
use crate::enums::{Habitat, Personality, Species};

/// Immutable identity of a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetProfile {
    /// Display name.
    pub name: String,
    /// Species tag.
    pub species: Species,
    /// Personality tag.
    pub personality: Personality,
    /// Food categories this pet eats.
    pub diet: DietFlags,
    /// Environment this pet belongs to.
    pub habitat: Habitat,
}

/// Navigation agent tuning for one pet.
///
/// A pet's *base* parameters are ground truth. Anything that scales the live
/// parameters must put the base values back when it lets go of the pet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocomotionParams {
    /// Linear speed in units per second.
    pub speed: f32,
    /// Turn rate in degrees per second.
    pub angular_speed: f32,
    /// Linear acceleration in units per second squared.
    pub acceleration: f32,
    /// Distance from the destination at which the agent counts as arrived.
    pub stopping_distance: f32,
}

impl LocomotionParams {
    /// Return a copy with every field multiplied by the matching factor.
    pub const fn scaled(self, factors: &LocomotionScale) -> Self {
        Self {
            speed: self.speed * factors.speed,
            angular_speed: self.angular_speed * factors.angular_speed,
            acceleration: self.acceleration * factors.acceleration,
            stopping_distance: self.stopping_distance * factors.stopping_distance,
        }
    }
}

impl Default for LocomotionParams {
    fn default() -> Self {
        Self {
            speed: 3.5,
            angular_speed: 120.0,
            acceleration: 8.0,
            stopping_distance: 0.5,
        }
    }
}

/// Per-field multipliers for [`LocomotionParams`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocomotionScale {
    /// Speed multiplier.
    pub speed: f32,
    /// Angular speed multiplier.
    pub angular_speed: f32,
    /// Acceleration multiplier.
    pub acceleration: f32,
    /// Stopping distance multiplier.
    pub stopping_distance: f32,
}

impl Default for LocomotionScale {
    fn default() -> Self {
        Self {
            speed: 1.0,
            angular_speed: 1.0,
            acceleration: 1.0,
            stopping_distance: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_multiplies_each_field() {
        let base = LocomotionParams {
            speed: 2.0,
            angular_speed: 100.0,
            acceleration: 5.0,
            stopping_distance: 0.5,
        };
        let scale = LocomotionScale {
            speed: 4.0,
            angular_speed: 4.0,
            acceleration: 4.0,
            stopping_distance: 3.0,
        };
        let scaled = base.scaled(&scale);
        assert!((scaled.speed - 8.0).abs() < f32::EPSILON);
        assert!((scaled.angular_speed - 400.0).abs() < f32::EPSILON);
        assert!((scaled.acceleration - 20.0).abs() < f32::EPSILON);
        assert!((scaled.stopping_distance - 1.5).abs() < f32::EPSILON);
    }
}
