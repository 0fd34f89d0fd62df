//! Shared fixtures for unit tests in this crate.

use menagerie_types::{
    DietFlags, Habitat, LocomotionParams, Personality, PetProfile, Species, Vec3,
};
use menagerie_world::{FlatNavMesh, Locomotion, RecordingPresentation, World};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::context::{AgentEvent, BehaviorContext};
use crate::needs::Needs;
use crate::pet::Pet;

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

/// In-memory services for driving seekers directly.
pub(crate) struct Harness {
    pub(crate) mesh: FlatNavMesh,
    pub(crate) presentation: RecordingPresentation,
    pub(crate) world: World,
    pub(crate) rng: StdRng,
    pub(crate) events: Vec<AgentEvent>,
}

impl Harness {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            mesh: FlatNavMesh::new(100.0),
            presentation: RecordingPresentation::new(),
            world: World::new(),
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub(crate) fn spawn(&mut self, pet: &Pet, position: Vec3) {
        self.mesh.register(pet.id, position, pet.base);
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
