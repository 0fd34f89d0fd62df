//! Services handed to the arbiter and seekers for one update.
//!
//! Seekers never own the engine services they drive. Each call receives a
//! [`BehaviorContext`] that borrows the navigation agents, presentation sink,
//! world, random source, and the event log of the current tick.

use menagerie_types::{PetId, TreeId};
use menagerie_world::{Locomotion, Presentation, World};
use rand::Rng;
use rand::rngs::StdRng;

use crate::feeding::FeedTarget;

/// Borrowed services for one behavior update.
pub struct BehaviorContext<'a> {
    /// Navigation agents.
    pub locomotion: &'a mut dyn Locomotion,
    /// Animation and emotion feedback.
    pub presentation: &'a mut dyn Presentation,
    /// Resources and tree occupancy.
    pub world: &'a mut World,
    /// Seeded random source.
    pub rng: &'a mut StdRng,
    /// Behavior events emitted during this tick.
    pub events: &'a mut Vec<AgentEvent>,
}

/// Something noteworthy a seeker did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEvent {
    /// A pet finished eating.
    Ate {
        /// The pet.
        pet: PetId,
        /// What it ate from.
        target: FeedTarget,
    },
    /// A pet fell asleep.
    FellAsleep {
        /// The pet.
        pet: PetId,
        /// Whether this is a low-quality forced sleep.
        forced: bool,
        /// Whether the pet sleeps in a tree.
        in_tree: bool,
    },
    /// A pet woke up.
    WokeUp {
        /// The pet.
        pet: PetId,
        /// Whether the sleep was cut short.
        interrupted: bool,
    },
    /// A pet started climbing a tree.
    ClimbedTree {
        /// The pet.
        pet: PetId,
        /// The tree.
        tree: TreeId,
    },
    /// A pet is back on the ground.
    LeftTree {
        /// The pet.
        pet: PetId,
        /// The tree.
        tree: TreeId,
    },
    /// A land pet got out of the water.
    ReachedShore {
        /// The pet.
        pet: PetId,
    },
    /// A water pet went for a swim.
    Swam {
        /// The pet.
        pet: PetId,
    },
}

/// Uniform roll in `[min, max)`, or `min` when the range is empty.
pub fn random_between(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

/// Bernoulli roll with `chance` clamped into `[0, 1]`.
pub fn roll(rng: &mut StdRng, chance: f64) -> bool {
    rng.random_bool(chance.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn random_between_handles_empty_range() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!((random_between(&mut rng, 3.0, 3.0) - 3.0).abs() < f32::EPSILON);
        for _ in 0..100 {
            let value = random_between(&mut rng, 2.5, 5.0);
            assert!((2.5..5.0).contains(&value));
        }
        assert!(!roll(&mut rng, -1.0));
        assert!(roll(&mut rng, 4.0));
    }
}
