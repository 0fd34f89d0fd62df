//! Shared fixtures for unit tests in this crate.

use menagerie_agents::{AgentEvent, BehaviorContext, Needs, Pet};
use menagerie_types::{DietFlags, Habitat, LocomotionParams, Personality, PetProfile, Species};
use menagerie_world::{FlatNavMesh, RecordingPresentation, World};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A pet with default locomotion and empty needs.
pub(crate) fn pet(species: Species, personality: Personality, habitat: Habitat) -> Pet {
    Pet::new(
        PetProfile {
            name: format!("{species:?}"),
            species,
            personality,
            diet: DietFlags::all(),
            habitat,
        },
        Needs::default(),
        LocomotionParams::default(),
    )
}

/// In-memory services for driving coordinators directly.
pub(crate) struct Stage {
    pub(crate) mesh: FlatNavMesh,
    pub(crate) presentation: RecordingPresentation,
    pub(crate) world: World,
    pub(crate) rng: StdRng,
    pub(crate) events: Vec<AgentEvent>,
}

impl Stage {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            mesh: FlatNavMesh::new(100.0),
            presentation: RecordingPresentation::new(),
            world: World::new(),
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub(crate) fn ctx(&mut self) -> BehaviorContext<'_> {
        BehaviorContext {
            locomotion: &mut self.mesh,
            presentation: &mut self.presentation,
            world: &mut self.world,
            rng: &mut self.rng,
            events: &mut self.events,
        }
    }
}
