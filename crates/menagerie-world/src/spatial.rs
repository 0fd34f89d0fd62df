//! Spatial overlap queries.
//!
//! [`SpatialQuery`] is the seam to the physics engine's overlap-sphere query.
//! [`World`] bundles the in-memory resource set with the tree registry and
//! answers the query directly, which is all the behavior layer needs.

use bitflags::bitflags;
use glam::Vec3;
use menagerie_types::{AreaId, FoodItemId, TreeId};

use crate::resources::WorldResources;
use crate::trees::TreeRegistry;

bitflags! {
    /// Entity categories an overlap query can filter on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Category: u8 {
        /// Consumable food items.
        const FOOD = 1;
        /// Feeding areas.
        const FEEDING_AREA = 1 << 1;
        /// Sleeping areas.
        const SLEEPING_AREA = 1 << 2;
        /// Climbable trees.
        const TREE = 1 << 3;
        /// Water zones.
        const WATER = 1 << 4;
    }
}

/// Reference to an entity found by a spatial query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityRef {
    /// A food item.
    Food(FoodItemId),
    /// A feeding area.
    FeedingArea(AreaId),
    /// A sleeping area.
    SleepingArea(AreaId),
    /// A tree.
    Tree(TreeId),
    /// A water zone.
    Water(AreaId),
}

/// One result of an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHit {
    /// What was found.
    pub entity: EntityRef,
    /// Where it is.
    pub position: Vec3,
}

/// Overlap-sphere query against world entities.
pub trait SpatialQuery {
    /// Every entity in `mask` whose position lies within `radius` of `center`.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Category) -> Vec<SpatialHit>;
}

/// The nearest hit to `origin` by squared distance. Ties keep the first hit.
pub fn nearest_hit(origin: Vec3, hits: &[SpatialHit]) -> Option<SpatialHit> {
    let mut best: Option<(SpatialHit, f32)> = None;
    for hit in hits {
        let dist_sq = hit.position.distance_squared(origin);
        if best.is_none_or(|(_, best_sq)| dist_sq < best_sq) {
            best = Some((*hit, dist_sq));
        }
    }
    best.map(|(hit, _)| hit)
}

/// The whole mutable world the behavior layer reads and claims from.
#[derive(Debug, Clone, Default)]
pub struct World {
    /// Food, areas, and water.
    pub resources: WorldResources,
    /// Climbable trees and their occupants.
    pub trees: TreeRegistry,
}

impl World {
    /// Create an empty world.
    pub const fn new() -> Self {
        Self {
            resources: WorldResources::new(),
            trees: TreeRegistry::new(),
        }
    }
}

impl SpatialQuery for World {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Category) -> Vec<SpatialHit> {
        let radius_sq = radius * radius;
        let within = |position: Vec3| position.distance_squared(center) <= radius_sq;
        let mut hits = Vec::new();

        if mask.contains(Category::FOOD) {
            hits.extend(
                self.resources
                    .food_items()
                    .filter(|item| within(item.position))
                    .map(|item| SpatialHit {
                        entity: EntityRef::Food(item.id),
                        position: item.position,
                    }),
            );
        }
        if mask.contains(Category::FEEDING_AREA) {
            hits.extend(
                self.resources
                    .feeding_areas()
                    .filter(|area| within(area.position))
                    .map(|area| SpatialHit {
                        entity: EntityRef::FeedingArea(area.id),
                        position: area.position,
                    }),
            );
        }
        if mask.contains(Category::SLEEPING_AREA) {
            hits.extend(
                self.resources
                    .sleeping_areas()
                    .filter(|area| within(area.position))
                    .map(|area| SpatialHit {
                        entity: EntityRef::SleepingArea(area.id),
                        position: area.position,
                    }),
            );
        }
        if mask.contains(Category::TREE) {
            hits.extend(
                self.trees
                    .iter()
                    .filter(|tree| within(tree.position))
                    .map(|tree| SpatialHit {
                        entity: EntityRef::Tree(tree.id),
                        position: tree.position,
                    }),
            );
        }
        if mask.contains(Category::WATER) {
            hits.extend(
                self.resources
                    .water_zones()
                    .filter(|zone| within(zone.center))
                    .map(|zone| SpatialHit {
                        entity: EntityRef::Water(zone.id),
                        position: zone.center,
                    }),
            );
        }
        hits
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_types::{DietFlags, FoodType, Habitat};

    use super::*;

    #[test]
    fn overlap_respects_mask_and_radius() {
        let mut world = World::new();
        let near_food = world.resources.add_food(Vec3::new(1.0, 0.0, 0.0), FoodType::Fish);
        world.resources.add_food(Vec3::new(40.0, 0.0, 0.0), FoodType::Fish);
        world
            .resources
            .add_feeding_area(Vec3::new(2.0, 0.0, 0.0), DietFlags::FISH);
        world
            .resources
            .add_sleeping_area(Vec3::new(3.0, 0.0, 0.0), Habitat::Forest);

        let hits = world.overlap_sphere(Vec3::ZERO, 10.0, Category::FOOD);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.first().unwrap().entity, EntityRef::Food(near_food));

        let both = world.overlap_sphere(Vec3::ZERO, 10.0, Category::FOOD | Category::FEEDING_AREA);
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn nearest_hit_picks_closest() {
        let hits = [
            SpatialHit {
                entity: EntityRef::Tree(TreeId::new()),
                position: Vec3::new(5.0, 0.0, 0.0),
            },
            SpatialHit {
                entity: EntityRef::Tree(TreeId::new()),
                position: Vec3::new(-2.0, 0.0, 0.0),
            },
        ];
        let best = nearest_hit(Vec3::ZERO, &hits).unwrap();
        assert_eq!(best, *hits.get(1).unwrap());
        assert!(nearest_hit(Vec3::ZERO, &[]).is_none());
    }
}
