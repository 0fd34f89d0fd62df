//! Tick cycle: the per-frame loop that drives every pet.
//!
//! Each tick runs through these phases in order:
//!
//! 1. **Clock** -- advance the fixed-step clock.
//! 2. **Commands** -- apply queued user commands (gather, cancel, pick up,
//!    put down, select, lock, scripted animation, drop food).
//! 3. **Needs** -- grow hunger and sleepiness.
//! 4. **Interactions** -- step every running interaction session.
//! 5. **Gathering** -- step every gathering monitor.
//! 6. **Arbitration** -- run the [`Arbiter`] for every pet.
//! 7. **Matching** -- look for new interaction pairs.
//! 8. **Locomotion** -- move every navigation agent.
//! 9. **Audit** -- check the exclusion and tree occupancy invariants.
//!
//! The cycle is deterministic given the same initial state, the same seed,
//! and the same command queue.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec3;
use menagerie_agents::{AgentEvent, Arbiter, Behavior, BehaviorContext, Needs, Pet};
use menagerie_types::{AnimationState, FoodType, LocomotionParams, PetId, PetProfile};
use menagerie_world::{FlatNavMesh, Locomotion, RecordingPresentation, World};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::clock::{ClockError, SimClock};
use crate::config::SimulationConfig;
use crate::gathering::{GatherReport, GatheringCoordinator};
use crate::interaction::{InteractionEvent, InteractionManager};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// A user command applied at the start of the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Gather every controllable pet around `target`, facing `camera`.
    Gather {
        /// Gathering point.
        target: Vec3,
        /// Camera position the pets turn towards.
        camera: Vec3,
    },
    /// Call off the current gather.
    CancelGather,
    /// Pick a pet up.
    PickUp(PetId),
    /// Put a held pet down at a point.
    PutDown(PetId, Vec3),
    /// Select or deselect a pet.
    Select(PetId, bool),
    /// Forbid or allow new autonomous behaviors and interactions for a pet.
    LockActions(PetId, bool),
    /// Hold an idle pet in place while a scripted animation plays.
    PlayAnimation {
        /// The pet to animate.
        pet: PetId,
        /// Animation to play.
        animation: AnimationState,
        /// Seconds before the pet is released.
        duration: f32,
    },
    /// Drop a food item into the world.
    DropFood {
        /// Where the food lands.
        position: Vec3,
        /// What kind of food it is.
        food: FoodType,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated seconds at the end of the tick.
    pub time: f64,
    /// Number of pets owned by each behavior at the end of the tick.
    pub behaviors: BTreeMap<Behavior, usize>,
    /// Behavior events emitted by the seekers.
    pub agent_events: Vec<AgentEvent>,
    /// Interaction sessions started and ended.
    pub interaction_events: Vec<InteractionEvent>,
    /// Outcome of a gather command applied this tick.
    pub gather: Option<GatherReport>,
    /// Commands applied this tick.
    pub commands_applied: usize,
    /// Invariant violations found by the audit. Always zero.
    pub violations: usize,
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// The simulation clock.
    pub clock: SimClock,
    /// Every pet, keyed by id.
    pub pets: BTreeMap<PetId, Pet>,
    /// Navigation agents.
    pub mesh: FlatNavMesh,
    /// Animation and emotion sink.
    pub presentation: RecordingPresentation,
    /// Resources and trees.
    pub world: World,
    /// Seeded random source shared by every behavior.
    pub rng: StdRng,
    /// Per-pet behavior arbitration.
    pub arbiter: Arbiter,
    /// Interaction sessions.
    pub interactions: InteractionManager,
    /// Gathering coordinator.
    pub gathering: GatheringCoordinator,
    /// Commands waiting for the next tick.
    pub commands: VecDeque<Command>,
}

impl SimulationState {
    /// Build an empty world from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the configured timestep is
    /// not positive.
    pub fn new(config: &SimulationConfig) -> Result<Self, ClockError> {
        Ok(Self {
            clock: SimClock::new(config.world.fixed_dt)?,
            pets: BTreeMap::new(),
            mesh: FlatNavMesh::new(config.world.half_extent),
            presentation: RecordingPresentation::new(),
            world: World::new(),
            rng: StdRng::seed_from_u64(config.world.seed),
            arbiter: Arbiter::new(config.behavior.clone()),
            interactions: InteractionManager::new(config.interaction.clone()),
            gathering: GatheringCoordinator::new(config.gathering.clone()),
            commands: VecDeque::new(),
        })
    }

    /// Add a pet at `position` and register its navigation agent.
    pub fn spawn_pet(
        &mut self,
        profile: PetProfile,
        needs: Needs,
        base: LocomotionParams,
        position: Vec3,
    ) -> PetId {
        let pet = Pet::new(profile, needs, base);
        let id = pet.id;
        let landing = self.mesh.sample_position(position, base.stopping_distance * 10.0);
        self.mesh.register(id, landing.unwrap_or(position), base);
        debug!(pet = %id, name = %pet.profile.name, species = ?pet.profile.species, "Pet spawned");
        self.pets.insert(id, pet);
        id
    }

    /// Look up a pet.
    pub fn pet(&self, id: PetId) -> Option<&Pet> {
        self.pets.get(&id)
    }

    /// Queue a command for the next tick.
    pub fn queue(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Count pets per owning behavior.
    pub fn behavior_counts(&self) -> BTreeMap<Behavior, usize> {
        let mut counts = BTreeMap::new();
        for pet in self.pets.values() {
            *counts.entry(pet.behavior()).or_insert(0) += 1;
        }
        counts
    }
}

/// Execute one complete tick of the simulation.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    // --- Phase 1: Clock ---
    let tick = state.clock.advance()?;
    let dt = state.clock.dt();
    state.presentation.clear_events();

    let mut summary = TickSummary {
        tick,
        time: state.clock.now(),
        ..TickSummary::default()
    };

    let SimulationState {
        pets,
        mesh,
        presentation,
        world,
        rng,
        arbiter,
        interactions,
        gathering,
        commands,
        ..
    } = state;
    let mut ctx = BehaviorContext {
        locomotion: mesh,
        presentation,
        world,
        rng,
        events: &mut summary.agent_events,
    };

    // --- Phase 2: Commands ---
    while let Some(command) = commands.pop_front() {
        summary.commands_applied += 1;
        if let Some(report) = apply_command(command, pets, arbiter, gathering, &mut ctx) {
            summary.gather = Some(report);
        }
    }

    // --- Phase 3: Needs ---
    let needs_config = &arbiter.config().needs;
    for pet in pets.values_mut() {
        let asleep = pet.is_sleeping();
        pet.needs.tick(dt, needs_config, asleep);
    }

    // --- Phase 4: Interactions ---
    interactions.update(pets, &mut ctx, dt, &mut summary.interaction_events);

    // --- Phase 5: Gathering ---
    gathering.update(pets, arbiter, &mut ctx, dt);

    // --- Phase 6: Arbitration ---
    for pet in pets.values_mut() {
        arbiter.update(pet, &mut ctx, dt);
    }

    // --- Phase 7: Matching ---
    interactions.scan(pets, arbiter, &mut ctx, dt, &mut summary.interaction_events);

    // --- Phase 8: Locomotion ---
    ctx.locomotion.advance(dt);

    // --- Phase 9: Audit ---
    summary.violations = audit(pets, ctx.world);

    summary.behaviors = state.behavior_counts();
    Ok(summary)
}

/// Apply one queued command. Returns the report of a gather command.
fn apply_command(
    command: Command,
    pets: &mut BTreeMap<PetId, Pet>,
    arbiter: &Arbiter,
    gathering: &mut GatheringCoordinator,
    ctx: &mut BehaviorContext<'_>,
) -> Option<GatherReport> {
    match command {
        Command::Gather { target, camera } => {
            return Some(gathering.gather(target, camera, pets, arbiter, ctx));
        }
        Command::CancelGather => {
            gathering.cancel(pets, arbiter, ctx);
        }
        Command::PickUp(id) => match pets.get_mut(&id) {
            Some(pet) => arbiter.pick_up(pet, ctx),
            None => warn!(pet = %id, "Pick up for unknown pet ignored"),
        },
        Command::PutDown(id, point) => match pets.get_mut(&id) {
            Some(pet) if pet.holding => arbiter.put_down(pet, point, ctx),
            Some(_) => debug!(pet = %id, "Put down for a pet that is not held ignored"),
            None => warn!(pet = %id, "Put down for unknown pet ignored"),
        },
        Command::Select(id, selected) => match pets.get_mut(&id) {
            Some(pet) => pet.selected = selected,
            None => warn!(pet = %id, "Select for unknown pet ignored"),
        },
        Command::LockActions(id, locked) => match pets.get_mut(&id) {
            Some(pet) => {
                pet.action_locked = locked;
                debug!(pet = %id, locked, "Action lock changed");
            }
            None => warn!(pet = %id, "Lock for unknown pet ignored"),
        },
        Command::PlayAnimation {
            pet,
            animation,
            duration,
        } => match pets.get_mut(&pet) {
            Some(target) => {
                arbiter.play_animation(target, animation, duration, ctx);
            }
            None => warn!(%pet, "Animation for unknown pet ignored"),
        },
        Command::DropFood { position, food } => {
            let item = ctx.world.resources.add_food(position, food);
            debug!(%item, ?food, "Food dropped");
        }
    }
    None
}

/// Count pets that break the exclusion or tree occupancy invariants.
fn audit(pets: &BTreeMap<PetId, Pet>, world: &World) -> usize {
    let mut violations = 0;
    for pet in pets.values() {
        if pet.exclusive_flag_count() > 1 {
            warn!(pet = %pet.id, behavior = ?pet.behavior(), "More than one exclusive behavior set");
            violations += 1;
        }
        if let Some(tree) = pet.current_tree {
            if world.trees.occupant(tree) != Some(pet.id) {
                warn!(pet = %pet.id, %tree, "Pet holds a tree it does not occupy");
                violations += 1;
            }
        }
    }
    for tree in world.trees.iter() {
        let holders = pets
            .values()
            .filter(|pet| pet.current_tree == Some(tree.id))
            .count();
        if holders > 1 {
            warn!(tree = %tree.id, holders, "Tree claimed by more than one pet");
            violations += 1;
        }
    }
    violations
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_agents::Activity;
    use menagerie_types::{DietFlags, Habitat, Personality, Species};

    use super::*;

    fn profile(species: Species) -> PetProfile {
        PetProfile {
            name: format!("{species:?}"),
            species,
            personality: Personality::Playful,
            diet: DietFlags::all(),
            habitat: Habitat::Field,
        }
    }

    fn state() -> SimulationState {
        SimulationState::new(&SimulationConfig::default()).unwrap()
    }

    #[test]
    fn tick_advances_clock_and_needs() {
        let mut state = state();
        let id = state.spawn_pet(
            profile(Species::Dog),
            Needs::default(),
            LocomotionParams::default(),
            Vec3::ZERO,
        );

        let summary = run_tick(&mut state).unwrap();

        assert_eq!(summary.tick, 1);
        assert!((summary.time - 0.1).abs() < 1e-6);
        assert!(state.pet(id).unwrap().needs.hunger() > 0.0);
        assert_eq!(summary.behaviors.get(&Behavior::Wander), Some(&1));
        assert_eq!(summary.violations, 0);
    }

    #[test]
    fn commands_apply_in_order() {
        let mut state = state();
        let id = state.spawn_pet(
            profile(Species::Cat),
            Needs::default(),
            LocomotionParams::default(),
            Vec3::ZERO,
        );
        state.queue(Command::Select(id, true));
        state.queue(Command::PickUp(id));
        state.queue(Command::DropFood {
            position: Vec3::new(5.0, 0.0, 5.0),
            food: FoodType::Fish,
        });

        let summary = run_tick(&mut state).unwrap();

        assert_eq!(summary.commands_applied, 3);
        let pet = state.pet(id).unwrap();
        assert!(pet.selected);
        assert!(matches!(pet.activity, Activity::Held));
        assert_eq!(state.world.resources.food_items().count(), 1);

        state.queue(Command::PutDown(id, Vec3::new(2.0, 0.0, 2.0)));
        run_tick(&mut state).unwrap();
        assert!(!state.pet(id).unwrap().holding);
        assert!(state.mesh.is_enabled(id));
    }

    #[test]
    fn unknown_pet_commands_are_ignored() {
        let mut state = state();
        state.queue(Command::PickUp(PetId::new()));
        state.queue(Command::PutDown(PetId::new(), Vec3::ZERO));

        let summary = run_tick(&mut state).unwrap();

        assert_eq!(summary.commands_applied, 2);
        assert!(state.pets.is_empty());
    }
}
