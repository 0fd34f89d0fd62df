//! World scatter and roster spawner.
//!
//! At startup the spawner lays out the static world (trees, food items,
//! feeding and sleeping areas, water zones) from the seeded random source,
//! then places every pet from the configured roster. Water pets start next
//! to a pond and tree pets next to a trunk; everyone else starts somewhere
//! on the open plane.

use std::collections::BTreeSet;

use glam::Vec3;
use menagerie_agents::{Needs, random_between};
use menagerie_core::config::{PetSpec, WorldConfig};
use menagerie_core::tick::SimulationState;
use menagerie_types::{DietFlags, FoodType, Habitat, LocomotionParams, PetId, PetProfile};
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::error::{EngineError, RosterIssue};

/// Share of the plane's half extent used for scattering.
const SCATTER_RATIO: f32 = 0.6;

/// Foods cycled through when scattering food items.
const FOODS: [FoodType; 6] = [
    FoodType::Meat,
    FoodType::Fish,
    FoodType::FruitsAndVegetables,
    FoodType::Insects,
    FoodType::Grass,
    FoodType::Nuts,
];

/// Habitats that sleep in a dedicated area.
const BEDDED_HABITATS: [Habitat; 3] = [Habitat::Forest, Habitat::Fence, Habitat::Water];

// -----------------------------------------------------------------------
// World scatter
// -----------------------------------------------------------------------

/// What [`scatter_world`] placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScatterResult {
    /// Trees registered.
    pub trees: usize,
    /// Food items dropped.
    pub food_items: usize,
    /// Feeding areas placed.
    pub feeding_areas: usize,
    /// Sleeping areas placed.
    pub sleeping_areas: usize,
    /// Water zones placed.
    pub water_zones: usize,
}

/// Lay out trees, food, areas, and water on the plane.
pub fn scatter_world(state: &mut SimulationState, config: &WorldConfig) -> ScatterResult {
    let spread = config.half_extent * SCATTER_RATIO;
    let mut result = ScatterResult::default();

    for _ in 0..config.trees {
        let position = random_point(&mut state.rng, spread);
        let height = random_between(&mut state.rng, 4.0, 8.0);
        let tree = state.world.trees.register(position, height);
        debug!(%tree, x = position.x, z = position.z, height, "Tree planted");
        result.trees += 1;
    }

    for (_, food) in (0..config.food_items).zip(FOODS.iter().cycle()) {
        let position = random_point(&mut state.rng, spread);
        state.world.resources.add_food(position, *food);
        result.food_items += 1;
    }

    let menus = [
        DietFlags::MEAT | DietFlags::FISH,
        DietFlags::FRUITS_AND_VEGETABLES | DietFlags::GRASS,
        DietFlags::INSECTS | DietFlags::NUTS,
    ];
    for serves in menus {
        let position = random_point(&mut state.rng, spread);
        state.world.resources.add_feeding_area(position, serves);
        result.feeding_areas += 1;
    }

    for habitat in BEDDED_HABITATS {
        let position = random_point(&mut state.rng, spread);
        state.world.resources.add_sleeping_area(position, habitat);
        result.sleeping_areas += 1;
    }

    for _ in 0..config.water_zones {
        let center = random_point(&mut state.rng, spread);
        let radius = random_between(&mut state.rng, 8.0, 14.0);
        state.world.resources.add_water_zone(center, radius);
        result.water_zones += 1;
    }

    info!(
        trees = result.trees,
        food_items = result.food_items,
        feeding_areas = result.feeding_areas,
        sleeping_areas = result.sleeping_areas,
        water_zones = result.water_zones,
        "World scattered"
    );
    result
}

// -----------------------------------------------------------------------
// Roster
// -----------------------------------------------------------------------

/// Spawn every pet from the roster. Returns the new ids in roster order.
///
/// The roster is validated before anything is placed.
///
/// # Errors
///
/// Returns [`EngineError::Roster`] on a duplicate name or a non-positive
/// speed override.
pub fn spawn_roster(
    state: &mut SimulationState,
    roster: &[PetSpec],
    half_extent: f32,
) -> Result<Vec<PetId>, EngineError> {
    validate_roster(roster)?;

    let spread = half_extent * SCATTER_RATIO;
    let mut ids = Vec::with_capacity(roster.len());
    for spec in roster {
        let base = LocomotionParams {
            speed: spec.speed.unwrap_or(LocomotionParams::default().speed),
            ..LocomotionParams::default()
        };
        let profile = PetProfile {
            name: spec.name.clone(),
            species: spec.species,
            personality: spec.personality,
            diet: spec.diet_flags(),
            habitat: spec.habitat,
        };
        let position = spawn_point(state, spec.habitat, spread);
        let id = state.spawn_pet(
            profile,
            Needs::new(spec.hunger, spec.sleepiness),
            base,
            position,
        );
        ids.push(id);
    }

    info!(pets = ids.len(), "Roster spawned");
    Ok(ids)
}

fn validate_roster(roster: &[PetSpec]) -> Result<(), EngineError> {
    let mut names = BTreeSet::new();
    for spec in roster {
        if !names.insert(spec.name.as_str()) {
            return Err(EngineError::Roster {
                name: spec.name.clone(),
                issue: RosterIssue::DuplicateName,
            });
        }
        if spec.speed.is_some_and(|speed| speed <= 0.0) {
            return Err(EngineError::Roster {
                name: spec.name.clone(),
                issue: RosterIssue::NonPositiveSpeed,
            });
        }
    }
    Ok(())
}

fn spawn_point(state: &mut SimulationState, habitat: Habitat, spread: f32) -> Vec3 {
    let anchor = match habitat {
        Habitat::Water => state
            .world
            .resources
            .water_zones()
            .next()
            .map(|zone| zone.center),
        Habitat::Tree => state.world.trees.iter().next().map(|tree| tree.position),
        Habitat::Field | Habitat::Forest | Habitat::Fence => None,
    };
    match anchor {
        Some(anchor) => anchor + random_point(&mut state.rng, 2.0),
        None => random_point(&mut state.rng, spread),
    }
}

fn random_point(rng: &mut StdRng, spread: f32) -> Vec3 {
    Vec3::new(
        random_between(rng, -spread, spread),
        0.0,
        random_between(rng, -spread, spread),
    )
}
