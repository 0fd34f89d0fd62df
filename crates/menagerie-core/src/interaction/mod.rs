//! Two-pet interactions.
//!
//! Pairs of idle pets standing close together may start a short joint
//! activity: a race, a nap side by side, or a stroll. Which pairs qualify is
//! a fixed, symmetric species table ([`can_interact`]). The
//! [`InteractionManager`] scans for eligible pairs, claims both pets through
//! the arbiter, and steps every running [`Session`].

pub mod race;
pub mod registry;
pub mod session;
pub mod sleep_together;
pub mod walk_together;

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use menagerie_agents::{Activity, AgentError, Arbiter, Behavior, BehaviorContext, Pet, roll};
use menagerie_types::{InteractionKind, LocomotionParams, PetId, SessionId, Species};
use menagerie_world::planar_distance;
use tracing::{debug, info};

pub use race::{Course, Race, RaceResult};
pub use registry::InteractionRegistry;
pub use session::{
    AbortReason, CapturedMotion, Choreography, RepairSettings, Session, SessionEnd, SessionState,
};
pub use sleep_together::SleepTogether;
pub use walk_together::WalkTogether;

use crate::config::InteractionConfig;

/// Errors from starting an interaction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InteractionError {
    /// A pet cannot interact with itself.
    #[error("pet {0} cannot interact with itself")]
    SamePet(PetId),

    /// One of the pets does not exist.
    #[error("pet not found: {0}")]
    PetNotFound(PetId),

    /// The two species have no interaction.
    #[error("{first:?} and {second:?} have no interaction")]
    NotEligible {
        /// Species of the first pet.
        first: Species,
        /// Species of the second pet.
        second: Species,
    },

    /// One of the pets is already in a session.
    #[error("pet {0} is already interacting")]
    Busy(PetId),

    /// One of the pets is held or owned by a higher-priority behavior.
    #[error("pet {0} is not available")]
    Unavailable(PetId),

    /// The arbiter refused the claim.
    #[error("claim rejected: {0}")]
    Claim(#[from] AgentError),
}

/// Something that happened to an interaction this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    /// A session started.
    Started {
        /// The session.
        session: SessionId,
        /// What the pets do together.
        kind: InteractionKind,
        /// The two pets.
        pets: [PetId; 2],
    },
    /// A session ended.
    Ended {
        /// The session.
        session: SessionId,
        /// What the pets did together.
        kind: InteractionKind,
        /// The two pets.
        pets: [PetId; 2],
        /// How it ended.
        end: SessionEnd,
        /// Race outcome, for races.
        race: Option<RaceResult>,
    },
}

/// Which interaction two species share, if any. Symmetric in its arguments.
pub const fn can_interact(first: Species, second: Species) -> Option<InteractionKind> {
    use Species::{Bear, Cat, Deer, Dog, Duck, Horse, Rabbit, Turtle, Wolf};
    match (first, second) {
        (Rabbit, Turtle) | (Turtle, Rabbit) => Some(InteractionKind::Race),
        (Wolf, Dog) | (Dog, Wolf) | (Cat, Cat) | (Dog, Dog) | (Bear, Bear) => {
            Some(InteractionKind::SleepTogether)
        }
        (Dog, Cat) | (Cat, Dog) | (Deer, Horse) | (Horse, Deer) | (Duck, Duck) => {
            Some(InteractionKind::WalkTogether)
        }
        _ => None,
    }
}

/// A pet as seen by a choreography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participant {
    /// The pet.
    pub id: PetId,
    /// Its species.
    pub species: Species,
    /// Its base locomotion parameters.
    pub base: LocomotionParams,
}

impl Participant {
    /// Snapshot a pet.
    pub const fn of(pet: &Pet) -> Self {
        Self {
            id: pet.id,
            species: pet.profile.species,
            base: pet.base,
        }
    }
}

/// Shared positioning thresholds for choreographies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Positioning {
    /// Seconds to wait for both pets to reach their spots.
    pub timeout: f32,
    /// Distance at which a pet counts as in place.
    pub arrival_distance: f32,
}

/// Result of stepping a choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Keep stepping.
    Running,
    /// Ran to completion.
    Finished,
    /// Cannot continue.
    Failed,
}

/// Whether `pet` stands within `distance` of `target` with no path pending.
pub(crate) fn arrived(ctx: &BehaviorContext<'_>, pet: PetId, target: Vec3, distance: f32) -> bool {
    !ctx.locomotion.is_path_pending(pet)
        && ctx
            .locomotion
            .position(pet)
            .is_some_and(|position| planar_distance(position, target) <= distance)
}

/// Flatten a vector onto the ground plane.
pub(crate) const fn ground(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Whether `pet` may be matched into a new session.
fn available(pet: &Pet, registry: &InteractionRegistry) -> bool {
    pet.is_idle()
        && !pet.holding
        && !pet.selected
        && !pet.action_locked
        && !pet.animation_locked
        && !pet.gathered
        && !registry.is_busy(pet.id)
}

/// Starts, steps, and ends interaction sessions.
#[derive(Debug, Clone)]
pub struct InteractionManager {
    config: InteractionConfig,
    registry: InteractionRegistry,
    sessions: Vec<Session>,
    scan_timer: f32,
}

impl InteractionManager {
    /// An idle manager. The first scan runs after one scan interval.
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            scan_timer: config.scan_interval,
            config,
            registry: InteractionRegistry::new(),
            sessions: Vec::new(),
        }
    }

    /// Interaction configuration.
    pub const fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Busy pets and pair cooldowns.
    pub const fn registry(&self) -> &InteractionRegistry {
        &self.registry
    }

    /// Running sessions.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// A running session by id.
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id() == id)
    }

    /// Start an interaction between `first` and `second`.
    ///
    /// Both pets are checked before either is touched. If the second claim
    /// still fails, the first pet is handed back to idle.
    ///
    /// # Errors
    ///
    /// Returns an [`InteractionError`] when the pets are the same, missing,
    /// ineligible, already interacting, or unavailable.
    pub fn start(
        &mut self,
        first: PetId,
        second: PetId,
        pets: &mut BTreeMap<PetId, Pet>,
        arbiter: &Arbiter,
        ctx: &mut BehaviorContext<'_>,
    ) -> Result<SessionId, InteractionError> {
        if first == second {
            return Err(InteractionError::SamePet(first));
        }
        let first_pet = pets.get(&first).ok_or(InteractionError::PetNotFound(first))?;
        let second_pet = pets
            .get(&second)
            .ok_or(InteractionError::PetNotFound(second))?;
        let kind = can_interact(first_pet.profile.species, second_pet.profile.species).ok_or(
            InteractionError::NotEligible {
                first: first_pet.profile.species,
                second: second_pet.profile.species,
            },
        )?;
        for pet in [first_pet, second_pet] {
            if self.registry.is_busy(pet.id) || pet.is_interacting() {
                return Err(InteractionError::Busy(pet.id));
            }
            if pet.holding || pet.behavior() >= Behavior::Interaction {
                return Err(InteractionError::Unavailable(pet.id));
            }
        }
        let participants = [Participant::of(first_pet), Participant::of(second_pet)];

        let session = SessionId::new();
        self.claim(first, second, session, pets, arbiter, ctx)?;
        if let Err(err) = self.claim(second, first, session, pets, arbiter, ctx) {
            if let Some(pet) = pets.get_mut(&first) {
                arbiter.release(pet, ctx);
            }
            return Err(err);
        }

        let captured = participants.map(|participant| CapturedMotion {
            params: ctx
                .locomotion
                .params(participant.id)
                .unwrap_or(participant.base),
            update_rotation: ctx.locomotion.update_rotation(participant.id),
        });
        let choreography = self.choreograph(kind, &participants, ctx);
        let repair = RepairSettings {
            radius: self.config.repair_radius,
            stabilization_wait: self.config.stabilization_wait,
        };
        self.sessions
            .push(Session::new(session, participants, captured, choreography, repair));
        self.registry.mark_busy(first, second);
        info!(%session, ?kind, %first, %second, "Interaction started");
        Ok(session)
    }

    /// Step every running session and retire the ones that ended.
    pub fn update(
        &mut self,
        pets: &mut BTreeMap<PetId, Pet>,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
        events: &mut Vec<InteractionEvent>,
    ) {
        self.registry.tick(dt);
        let sessions = std::mem::take(&mut self.sessions);
        for mut session in sessions {
            let Some(end) = session.step(pets, ctx, dt) else {
                self.sessions.push(session);
                continue;
            };
            let [first, second] = session.pets();
            self.registry.free(first, second, self.config.pair_cooldown);
            events.push(InteractionEvent::Ended {
                session: session.id(),
                kind: session.kind(),
                pets: [first, second],
                end,
                race: session.race_result(),
            });
        }
    }

    /// Look for eligible idle pairs and start interactions between them.
    ///
    /// Runs once every `scan_interval` seconds. A pet joins at most one new
    /// session per scan.
    pub fn scan(
        &mut self,
        pets: &mut BTreeMap<PetId, Pet>,
        arbiter: &Arbiter,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
        events: &mut Vec<InteractionEvent>,
    ) {
        self.scan_timer -= dt;
        if self.scan_timer > 0.0 {
            return;
        }
        self.scan_timer = self.config.scan_interval;

        let candidates: Vec<(PetId, Species, Vec3)> = pets
            .values()
            .filter(|pet| available(pet, &self.registry))
            .filter_map(|pet| {
                ctx.locomotion
                    .position(pet.id)
                    .map(|position| (pet.id, pet.profile.species, position))
            })
            .collect();

        let mut matched = BTreeSet::new();
        for (index, &(first, first_species, first_at)) in candidates.iter().enumerate() {
            if matched.contains(&first) {
                continue;
            }
            for &(second, second_species, second_at) in candidates.iter().skip(index + 1) {
                if matched.contains(&second)
                    || self.registry.on_cooldown(first, second)
                    || planar_distance(first_at, second_at) > self.config.match_radius
                {
                    continue;
                }
                let Some(kind) = can_interact(first_species, second_species) else {
                    continue;
                };
                if !roll(ctx.rng, self.config.start_chance) {
                    continue;
                }
                match self.start(first, second, pets, arbiter, ctx) {
                    Ok(session) => {
                        matched.insert(first);
                        matched.insert(second);
                        events.push(InteractionEvent::Started {
                            session,
                            kind,
                            pets: [first, second],
                        });
                        break;
                    }
                    Err(err) => debug!(%first, %second, %err, "Interaction not started"),
                }
            }
        }
    }

    /// Abort every session `pet` takes part in.
    pub fn abort_for(
        &mut self,
        pet: PetId,
        reason: AbortReason,
        pets: &mut BTreeMap<PetId, Pet>,
        ctx: &mut BehaviorContext<'_>,
        events: &mut Vec<InteractionEvent>,
    ) {
        let sessions = std::mem::take(&mut self.sessions);
        for mut session in sessions {
            if !session.involves(pet) {
                self.sessions.push(session);
                continue;
            }
            let end = session.abort(reason, pets, ctx);
            let [first, second] = session.pets();
            self.registry.free(first, second, self.config.pair_cooldown);
            events.push(InteractionEvent::Ended {
                session: session.id(),
                kind: session.kind(),
                pets: [first, second],
                end,
                race: session.race_result(),
            });
        }
    }

    fn claim(
        &self,
        pet: PetId,
        partner: PetId,
        session: SessionId,
        pets: &mut BTreeMap<PetId, Pet>,
        arbiter: &Arbiter,
        ctx: &mut BehaviorContext<'_>,
    ) -> Result<(), InteractionError> {
        let target = pets.get_mut(&pet).ok_or(InteractionError::PetNotFound(pet))?;
        arbiter.claim_external(target, Activity::Interacting { session, partner }, ctx)?;
        Ok(())
    }

    fn choreograph(
        &self,
        kind: InteractionKind,
        participants: &[Participant; 2],
        ctx: &mut BehaviorContext<'_>,
    ) -> Choreography {
        let [first, second] = participants;
        let positioning = Positioning {
            timeout: self.config.positioning_timeout,
            arrival_distance: self.config.arrival_distance,
        };
        match kind {
            InteractionKind::Race => {
                let (rabbit, turtle) = race::assign_roles(first, second, ctx.rng);
                Choreography::Race(Box::new(Race::new(
                    self.config.race.clone(),
                    positioning,
                    rabbit,
                    turtle,
                )))
            }
            InteractionKind::SleepTogether => {
                let spacing = sleep_together::spacing_for(
                    first.species,
                    second.species,
                    &self.config.sleep_together,
                );
                Choreography::SleepTogether(SleepTogether::new(
                    self.config.sleep_together.clone(),
                    positioning,
                    first.id,
                    second.id,
                    spacing,
                ))
            }
            InteractionKind::WalkTogether => Choreography::WalkTogether(WalkTogether::new(
                self.config.walk_together.clone(),
                positioning,
                first,
                second,
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_agents::BehaviorConfig;
    use menagerie_types::{Emotion, Habitat, Personality};
    use menagerie_world::Locomotion;

    use super::*;
    use crate::test_support::{Stage, pet};

    const DT: f32 = 0.1;

    fn pair(stage: &mut Stage, first: Species, second: Species) -> BTreeMap<PetId, Pet> {
        let a = pet(first, Personality::Playful, Habitat::Field);
        let b = pet(second, Personality::Playful, Habitat::Field);
        stage.mesh.register(a.id, Vec3::new(-2.0, 0.0, 0.0), a.base);
        stage.mesh.register(b.id, Vec3::new(2.0, 0.0, 0.0), b.base);
        [(a.id, a), (b.id, b)].into_iter().collect()
    }

    fn ids(pets: &BTreeMap<PetId, Pet>) -> (PetId, PetId) {
        let mut keys = pets.keys().copied();
        (keys.next().unwrap(), keys.next().unwrap())
    }

    #[test]
    fn eligibility_table_is_symmetric() {
        let all = [
            Species::Rabbit,
            Species::Turtle,
            Species::Wolf,
            Species::Dog,
            Species::Cat,
            Species::Fox,
            Species::Bear,
            Species::Deer,
            Species::Horse,
            Species::Squirrel,
            Species::Monkey,
            Species::Duck,
            Species::Frog,
            Species::Elephant,
        ];
        for first in all {
            for second in all {
                assert_eq!(can_interact(first, second), can_interact(second, first));
            }
        }
        assert_eq!(can_interact(Species::Rabbit, Species::Turtle), Some(InteractionKind::Race));
        assert_eq!(can_interact(Species::Cat, Species::Cat), Some(InteractionKind::SleepTogether));
        assert_eq!(can_interact(Species::Duck, Species::Duck), Some(InteractionKind::WalkTogether));
        assert_eq!(can_interact(Species::Fox, Species::Fox), None);
    }

    #[test]
    fn start_claims_both_pets() {
        let mut stage = Stage::new(1);
        let mut pets = pair(&mut stage, Species::Cat, Species::Cat);
        let (a, b) = ids(&pets);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut manager = InteractionManager::new(InteractionConfig::default());

        let session = manager
            .start(a, b, &mut pets, &arbiter, &mut stage.ctx())
            .unwrap();

        assert_eq!(pets.get(&a).unwrap().interaction_partner(), Some(b));
        assert_eq!(pets.get(&b).unwrap().interaction_partner(), Some(a));
        assert_eq!(pets.get(&a).unwrap().interaction_session(), Some(session));
        assert!(manager.registry().is_busy(a));
        assert_eq!(
            manager.start(a, b, &mut pets, &arbiter, &mut stage.ctx()),
            Err(InteractionError::Busy(a))
        );
    }

    #[test]
    fn ineligible_pair_is_untouched() {
        let mut stage = Stage::new(1);
        let mut pets = pair(&mut stage, Species::Fox, Species::Cat);
        let (a, b) = ids(&pets);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut manager = InteractionManager::new(InteractionConfig::default());

        let result = manager.start(a, b, &mut pets, &arbiter, &mut stage.ctx());

        assert!(matches!(result, Err(InteractionError::NotEligible { .. })));
        assert!(pets.values().all(Pet::is_idle));
        assert_eq!(manager.registry().busy_count(), 0);
    }

    #[test]
    fn held_pet_cannot_start() {
        let mut stage = Stage::new(1);
        let mut pets = pair(&mut stage, Species::Dog, Species::Cat);
        let (a, b) = ids(&pets);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        arbiter.pick_up(pets.get_mut(&b).unwrap(), &mut stage.ctx());
        let mut manager = InteractionManager::new(InteractionConfig::default());

        let result = manager.start(a, b, &mut pets, &arbiter, &mut stage.ctx());

        assert_eq!(result, Err(InteractionError::Unavailable(b)));
        assert!(pets.get(&a).unwrap().is_idle());
    }

    #[test]
    fn picking_up_a_participant_aborts_the_session() {
        let mut stage = Stage::new(2);
        let mut pets = pair(&mut stage, Species::Cat, Species::Cat);
        let (a, b) = ids(&pets);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut manager = InteractionManager::new(InteractionConfig::default());
        manager
            .start(a, b, &mut pets, &arbiter, &mut stage.ctx())
            .unwrap();
        let mut events = Vec::new();
        for _ in 0..20 {
            manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);
            stage.mesh.advance(DT);
        }

        arbiter.pick_up(pets.get_mut(&a).unwrap(), &mut stage.ctx());
        manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);

        assert!(manager.sessions().is_empty());
        assert!(matches!(
            events.last(),
            Some(InteractionEvent::Ended {
                end: SessionEnd::Aborted {
                    reason: AbortReason::Held(_)
                },
                ..
            })
        ));
        assert!(matches!(pets.get(&a).unwrap().activity, Activity::Held));
        assert!(pets.get(&b).unwrap().is_idle());
        assert!(stage.mesh.is_enabled(b));
        assert!(manager.registry().on_cooldown(a, b));
        assert_eq!(stage.presentation.emotion(b), None::<Emotion>);
    }

    #[test]
    fn cleanup_restores_the_captured_rotation_setting() {
        let mut stage = Stage::new(2);
        let mut pets = pair(&mut stage, Species::Cat, Species::Cat);
        let (a, b) = ids(&pets);
        stage.mesh.set_update_rotation(b, false);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut manager = InteractionManager::new(InteractionConfig::default());
        manager
            .start(a, b, &mut pets, &arbiter, &mut stage.ctx())
            .unwrap();
        let mut events = Vec::new();
        for _ in 0..5 {
            manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);
            stage.mesh.advance(DT);
        }

        arbiter.pick_up(pets.get_mut(&a).unwrap(), &mut stage.ctx());
        manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);

        assert!(manager.sessions().is_empty());
        assert!(pets.get(&b).unwrap().is_idle());
        assert!(!stage.mesh.update_rotation(b));
        assert!(stage.mesh.update_rotation(a));
    }

    #[test]
    fn off_mesh_pet_is_repaired_before_performing() {
        let mut stage = Stage::new(3);
        let mut pets = pair(&mut stage, Species::Duck, Species::Duck);
        let (a, b) = ids(&pets);
        stage.mesh.set_position(a, Vec3::new(-2.0, 1.5, 0.0));
        assert!(!stage.mesh.is_on_navmesh(a));
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut manager = InteractionManager::new(InteractionConfig::default());
        let session = manager
            .start(a, b, &mut pets, &arbiter, &mut stage.ctx())
            .unwrap();
        let mut events = Vec::new();

        manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);
        assert_eq!(
            manager.session(session).unwrap().state(),
            SessionState::PositioningNavMesh
        );
        manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);
        assert!(!stage.mesh.is_enabled(a));
        manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);
        assert!(stage.mesh.is_on_navmesh(a));

        for _ in 0..5 {
            manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);
        }
        assert_eq!(
            manager.session(session).unwrap().state(),
            SessionState::Performing
        );
    }

    #[test]
    fn completed_walk_restores_captured_params() {
        let mut stage = Stage::new(4);
        let mut pets = pair(&mut stage, Species::Dog, Species::Cat);
        let (a, b) = ids(&pets);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut manager = InteractionManager::new(InteractionConfig::default());
        manager
            .start(a, b, &mut pets, &arbiter, &mut stage.ctx())
            .unwrap();
        let mut events = Vec::new();

        for _ in 0..600 {
            manager.update(&mut pets, &mut stage.ctx(), DT, &mut events);
            stage.mesh.advance(DT);
            if !events.is_empty() {
                break;
            }
        }

        assert!(matches!(
            events.as_slice(),
            [InteractionEvent::Ended {
                kind: InteractionKind::WalkTogether,
                end: SessionEnd::Completed,
                ..
            }]
        ));
        for id in [a, b] {
            assert!(pets.get(&id).unwrap().is_idle());
            assert_eq!(stage.mesh.params(id), Some(pets.get(&id).unwrap().base));
        }
    }

    #[test]
    fn scan_pairs_nearby_idle_pets() {
        let mut stage = Stage::new(5);
        let mut pets = pair(&mut stage, Species::Rabbit, Species::Turtle);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut manager = InteractionManager::new(InteractionConfig {
            start_chance: 1.0,
            ..InteractionConfig::default()
        });
        let mut events = Vec::new();

        manager.scan(&mut pets, &arbiter, &mut stage.ctx(), DT, &mut events);
        assert!(events.is_empty());
        let interval = manager.config().scan_interval;
        manager.scan(&mut pets, &arbiter, &mut stage.ctx(), interval, &mut events);

        assert!(matches!(
            events.as_slice(),
            [InteractionEvent::Started {
                kind: InteractionKind::Race,
                ..
            }]
        ));
        assert!(pets.values().all(Pet::is_interacting));
    }
}
