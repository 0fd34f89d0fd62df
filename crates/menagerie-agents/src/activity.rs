//! The per-pet owner of record.
//!
//! A pet's [`Activity`] says which subsystem currently drives its
//! locomotion. Because a pet holds exactly one activity, two behaviors can
//! never own the same pet at once; there are no independent flags to fall
//! out of sync.
//!
//! [`Behavior`] is the priority view of an activity. Its declaration order is
//! the arbitration order, lowest first, so `Ord` compares priorities.

use menagerie_types::{PetId, SessionId};

use crate::climbing::ClimbTask;
use crate::feeding::FeedingTask;
use crate::sleeping::SleepTask;
use crate::water::WaterTask;
use crate::wander::WanderState;

/// Arbitration priority of whatever owns a pet, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Behavior {
    /// Idle wandering.
    Wander,
    /// Heading to shore or back into water.
    Water,
    /// Seeking a bed or sleeping properly.
    Sleeping,
    /// Seeking food or eating.
    Feeding,
    /// Ambient tree climbing.
    TreeClimb,
    /// Low-quality sleep on the spot.
    ForcedSleep,
    /// Gathering override.
    Gathering,
    /// Two-pet interaction session.
    Interaction,
    /// Picked up by the user.
    Held,
}

impl Behavior {
    /// Whether this behavior is driven from outside the arbiter.
    pub const fn is_external(self) -> bool {
        matches!(self, Self::Gathering | Self::Interaction | Self::Held)
    }
}

/// Result of stepping an autonomous task for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Keep stepping next tick.
    Running,
    /// The task ended (completed or abandoned); hand the pet back.
    Done,
}

/// What currently owns a pet.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    /// No behavior owns the pet; it wanders.
    Idle(WanderState),
    /// The user is holding the pet.
    Held,
    /// The pet is part of an interaction session.
    Interacting {
        /// Session the pet belongs to.
        session: SessionId,
        /// The other pet in the session.
        partner: PetId,
    },
    /// The gathering coordinator owns the pet.
    Gathering {
        /// Gather command version captured when the pet was assigned.
        version: u64,
    },
    /// The sleeping seeker owns the pet.
    Sleeping(SleepTask),
    /// The climbing seeker owns the pet.
    Climbing(ClimbTask),
    /// The feeding seeker owns the pet.
    Feeding(FeedingTask),
    /// The water seeker owns the pet.
    Water(WaterTask),
}

impl Activity {
    /// An idle activity that picks a wander target on the next update.
    pub const fn idle() -> Self {
        Self::Idle(WanderState::retarget_now())
    }

    /// Priority of this activity.
    pub const fn behavior(&self) -> Behavior {
        match self {
            Self::Idle(_) => Behavior::Wander,
            Self::Held => Behavior::Held,
            Self::Interacting { .. } => Behavior::Interaction,
            Self::Gathering { .. } => Behavior::Gathering,
            Self::Sleeping(task) if task.is_forced() => Behavior::ForcedSleep,
            Self::Sleeping(_) => Behavior::Sleeping,
            Self::Climbing(_) => Behavior::TreeClimb,
            Self::Feeding(_) => Behavior::Feeding,
            Self::Water(_) => Behavior::Water,
        }
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_follow_arbitration_order() {
        let order = [
            Behavior::Wander,
            Behavior::Water,
            Behavior::Sleeping,
            Behavior::Feeding,
            Behavior::TreeClimb,
            Behavior::ForcedSleep,
            Behavior::Gathering,
            Behavior::Interaction,
            Behavior::Held,
        ];
        for pair in order.windows(2) {
            if let [low, high] = pair {
                assert!(low < high, "{low:?} should rank below {high:?}");
            }
        }
    }

    #[test]
    fn external_behaviors() {
        assert!(Behavior::Held.is_external());
        assert!(Behavior::Gathering.is_external());
        assert!(!Behavior::ForcedSleep.is_external());
        assert_eq!(Activity::default().behavior(), Behavior::Wander);
    }
}
