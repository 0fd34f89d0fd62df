//! The pet aggregate.
//!
//! A [`Pet`] bundles identity, needs, base locomotion, user-driven flags, and
//! the single [`Activity`] that owns it. The classic "is interacting / is
//! climbing / is sleeping" flags are derived from the activity, so at most
//! one of them can ever be true.

use menagerie_types::{LocomotionParams, PetId, PetProfile, SessionId, TreeId};

use crate::activity::{Activity, Behavior};
use crate::needs::Needs;

/// Countdown timers gating repeated autonomous checks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cooldowns {
    /// Seconds until the next food search.
    pub feeding_search: f32,
    /// Seconds until the next bed search.
    pub sleeping_search: f32,
    /// Seconds until the next ambient climb roll.
    pub climb_check: f32,
    /// Seconds until the next return-to-water roll.
    pub water_check: f32,
    /// Seconds left on a scripted animation.
    pub animation_lock: f32,
}

impl Cooldowns {
    /// Count every timer down by `dt`, stopping at zero.
    pub fn tick(&mut self, dt: f32) {
        for timer in [
            &mut self.feeding_search,
            &mut self.sleeping_search,
            &mut self.climb_check,
            &mut self.water_check,
            &mut self.animation_lock,
        ] {
            *timer = (*timer - dt).max(0.0);
        }
    }
}

/// A simulated pet.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Pet {
    /// Identifier.
    pub id: PetId,
    /// Immutable identity tags.
    pub profile: PetProfile,
    /// Hunger and sleepiness.
    pub needs: Needs,
    /// Ground-truth locomotion parameters.
    pub base: LocomotionParams,
    /// Picked up by the user.
    pub holding: bool,
    /// Selected by the user.
    pub selected: bool,
    /// No new autonomous behavior may start.
    pub action_locked: bool,
    /// A scripted animation is playing; autonomous behaviors wait.
    pub animation_locked: bool,
    /// Standing at a gathering slot, not wandering.
    pub gathered: bool,
    /// Tree currently claimed by this pet.
    pub current_tree: Option<TreeId>,
    /// Bumped on every gathering command and cancellation.
    pub gather_command_version: u64,
    /// Owner of record.
    pub activity: Activity,
    /// Autonomous check timers.
    pub cooldowns: Cooldowns,
}

impl Pet {
    /// Create an idle pet.
    pub fn new(profile: PetProfile, needs: Needs, base: LocomotionParams) -> Self {
        Self {
            id: PetId::new(),
            profile,
            needs,
            base,
            holding: false,
            selected: false,
            action_locked: false,
            animation_locked: false,
            gathered: false,
            current_tree: None,
            gather_command_version: 0,
            activity: Activity::idle(),
            cooldowns: Cooldowns::default(),
        }
    }

    /// Priority of whatever owns the pet.
    pub const fn behavior(&self) -> Behavior {
        self.activity.behavior()
    }

    /// Whether the pet is in an interaction session.
    pub const fn is_interacting(&self) -> bool {
        matches!(self.activity, Activity::Interacting { .. })
    }

    /// The interaction partner, if any.
    pub const fn interaction_partner(&self) -> Option<PetId> {
        match self.activity {
            Activity::Interacting { partner, .. } => Some(partner),
            _ => None,
        }
    }

    /// The interaction session, if any.
    pub const fn interaction_session(&self) -> Option<SessionId> {
        match self.activity {
            Activity::Interacting { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Whether the gathering coordinator owns the pet.
    pub const fn is_gathering(&self) -> bool {
        matches!(self.activity, Activity::Gathering { .. })
    }

    /// Whether the pet is on an ambient tree climb.
    pub const fn is_climbing_tree(&self) -> bool {
        matches!(self.activity, Activity::Climbing(_))
    }

    /// Whether the pet is asleep (on the ground or in a tree).
    pub fn is_sleeping(&self) -> bool {
        matches!(&self.activity, Activity::Sleeping(task) if task.is_asleep())
    }

    /// Whether the pet is eating.
    pub const fn is_eating(&self) -> bool {
        matches!(&self.activity, Activity::Feeding(task) if task.is_eating())
    }

    /// Number of exclusive behavior flags currently set. Always 0 or 1.
    pub fn exclusive_flag_count(&self) -> usize {
        [
            self.is_interacting(),
            self.is_gathering(),
            self.is_climbing_tree(),
            self.is_sleeping(),
            self.is_eating(),
        ]
        .into_iter()
        .filter(|flag| *flag)
        .count()
    }

    /// Whether commands like gathering may take the pet.
    pub const fn is_controllable(&self) -> bool {
        !self.holding && !self.is_interacting()
    }

    /// Whether nothing but wandering owns the pet.
    pub const fn is_idle(&self) -> bool {
        matches!(self.activity, Activity::Idle(_))
    }
}

#[cfg(test)]
mod tests {
    use menagerie_types::{Habitat, Personality, Species};

    use super::*;
    use crate::test_support::pet;

    #[test]
    fn derived_flags_follow_activity() {
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        assert!(dog.is_idle());
        assert_eq!(dog.exclusive_flag_count(), 0);

        let partner = PetId::new();
        dog.activity = Activity::Interacting {
            session: SessionId::new(),
            partner,
        };
        assert!(dog.is_interacting());
        assert_eq!(dog.interaction_partner(), Some(partner));
        assert!(!dog.is_controllable());
        assert_eq!(dog.exclusive_flag_count(), 1);

        dog.activity = Activity::Gathering { version: 3 };
        assert!(dog.is_gathering());
        assert_eq!(dog.interaction_partner(), None);
        assert_eq!(dog.exclusive_flag_count(), 1);
    }

    #[test]
    fn cooldowns_stop_at_zero() {
        let mut cooldowns = Cooldowns {
            feeding_search: 1.0,
            sleeping_search: 0.2,
            climb_check: 0.0,
            water_check: 3.0,
            animation_lock: 0.4,
        };
        cooldowns.tick(0.5);
        assert!((cooldowns.feeding_search - 0.5).abs() < f32::EPSILON);
        assert!(cooldowns.sleeping_search.abs() < f32::EPSILON);
        assert!(cooldowns.climb_check.abs() < f32::EPSILON);
        assert!((cooldowns.water_check - 2.5).abs() < f32::EPSILON);
        assert!(cooldowns.animation_lock.abs() < f32::EPSILON);
    }
}
