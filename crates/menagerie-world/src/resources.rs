//! Static and consumable world resources.
//!
//! Feeding areas, sleeping areas, and water zones are placed once and never
//! consumed. Food items are consumable: the pet whose eating sequence finishes
//! first removes the item, and every other pet still targeting it must notice
//! the stale reference on its next lookup.

use std::collections::BTreeMap;

use glam::Vec3;
use menagerie_types::{AreaId, DietFlags, FoodItemId, FoodType, Habitat};

use crate::error::WorldError;

/// A consumable food item lying in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodItem {
    /// Item identifier.
    pub id: FoodItemId,
    /// Current position. Items can be moved (thrown, carried).
    pub position: Vec3,
    /// What kind of food this is.
    pub food: FoodType,
}

/// A static place where pets with a matching diet can eat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedingArea {
    /// Area identifier.
    pub id: AreaId,
    /// Center of the area.
    pub position: Vec3,
    /// Food categories served here.
    pub serves: DietFlags,
}

/// A static place where pets of a matching habitat sleep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepingArea {
    /// Area identifier.
    pub id: AreaId,
    /// Center of the area.
    pub position: Vec3,
    /// Habitat this area belongs to.
    pub habitat: Habitat,
}

/// A circular body of water on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterZone {
    /// Zone identifier.
    pub id: AreaId,
    /// Center of the zone.
    pub center: Vec3,
    /// Radius on the XZ plane.
    pub radius: f32,
}

impl WaterZone {
    /// Whether `point` lies inside the zone (XZ plane).
    pub fn contains(&self, point: Vec3) -> bool {
        planar_distance(self.center, point) <= self.radius
    }

    /// The point on the shore nearest to `point`, pushed `margin` units out.
    pub fn shore_point(&self, point: Vec3, margin: f32) -> Vec3 {
        let offset = Vec3::new(point.x - self.center.x, 0.0, point.z - self.center.z);
        let direction = offset.try_normalize().unwrap_or(Vec3::X);
        Vec3::new(self.center.x, 0.0, self.center.z) + direction * (self.radius + margin)
    }

    /// A point inside the zone on the line from its center towards `point`.
    pub fn inner_point(&self, point: Vec3, depth_ratio: f32) -> Vec3 {
        let offset = Vec3::new(point.x - self.center.x, 0.0, point.z - self.center.z);
        let direction = offset.try_normalize().unwrap_or(Vec3::X);
        let reach = self.radius * (1.0 - depth_ratio.clamp(0.0, 1.0));
        Vec3::new(self.center.x, 0.0, self.center.z) + direction * reach
    }
}

/// Distance between two points ignoring height.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec3::new(a.x - b.x, 0.0, a.z - b.z).length()
}

/// Every non-tree resource in the world.
#[derive(Debug, Clone, Default)]
pub struct WorldResources {
    food: BTreeMap<FoodItemId, FoodItem>,
    feeding_areas: BTreeMap<AreaId, FeedingArea>,
    sleeping_areas: BTreeMap<AreaId, SleepingArea>,
    water_zones: BTreeMap<AreaId, WaterZone>,
}

impl WorldResources {
    /// Create an empty resource set.
    pub const fn new() -> Self {
        Self {
            food: BTreeMap::new(),
            feeding_areas: BTreeMap::new(),
            sleeping_areas: BTreeMap::new(),
            water_zones: BTreeMap::new(),
        }
    }

    // --- Food items ---

    /// Place a food item.
    pub fn add_food(&mut self, position: Vec3, food: FoodType) -> FoodItemId {
        let id = FoodItemId::new();
        self.food.insert(id, FoodItem { id, position, food });
        id
    }

    /// Look up a food item. `None` once it has been eaten.
    pub fn food(&self, id: FoodItemId) -> Option<&FoodItem> {
        self.food.get(&id)
    }

    /// Move a food item to a new position.
    pub fn move_food(&mut self, id: FoodItemId, position: Vec3) -> Result<(), WorldError> {
        let item = self.food.get_mut(&id).ok_or(WorldError::FoodNotFound(id))?;
        item.position = position;
        Ok(())
    }

    /// Remove (consume) a food item.
    pub fn consume_food(&mut self, id: FoodItemId) -> Result<FoodItem, WorldError> {
        self.food.remove(&id).ok_or(WorldError::FoodNotFound(id))
    }

    /// Iterate over all food items.
    pub fn food_items(&self) -> impl Iterator<Item = &FoodItem> {
        self.food.values()
    }

    // --- Areas ---

    /// Place a feeding area.
    pub fn add_feeding_area(&mut self, position: Vec3, serves: DietFlags) -> AreaId {
        let id = AreaId::new();
        self.feeding_areas.insert(
            id,
            FeedingArea {
                id,
                position,
                serves,
            },
        );
        id
    }

    /// Look up a feeding area.
    pub fn feeding_area(&self, id: AreaId) -> Option<&FeedingArea> {
        self.feeding_areas.get(&id)
    }

    /// Iterate over all feeding areas.
    pub fn feeding_areas(&self) -> impl Iterator<Item = &FeedingArea> {
        self.feeding_areas.values()
    }

    /// Place a sleeping area.
    pub fn add_sleeping_area(&mut self, position: Vec3, habitat: Habitat) -> AreaId {
        let id = AreaId::new();
        self.sleeping_areas.insert(
            id,
            SleepingArea {
                id,
                position,
                habitat,
            },
        );
        id
    }

    /// Look up a sleeping area.
    pub fn sleeping_area(&self, id: AreaId) -> Option<&SleepingArea> {
        self.sleeping_areas.get(&id)
    }

    /// Iterate over all sleeping areas.
    pub fn sleeping_areas(&self) -> impl Iterator<Item = &SleepingArea> {
        self.sleeping_areas.values()
    }

    // --- Water ---

    /// Place a water zone.
    pub fn add_water_zone(&mut self, center: Vec3, radius: f32) -> AreaId {
        let id = AreaId::new();
        self.water_zones
            .insert(id, WaterZone { id, center, radius });
        id
    }

    /// Look up a water zone.
    pub fn water_zone(&self, id: AreaId) -> Option<&WaterZone> {
        self.water_zones.get(&id)
    }

    /// The water zone containing `point`, if any.
    pub fn water_at(&self, point: Vec3) -> Option<&WaterZone> {
        self.water_zones.values().find(|zone| zone.contains(point))
    }

    /// Iterate over all water zones.
    pub fn water_zones(&self) -> impl Iterator<Item = &WaterZone> {
        self.water_zones.values()
    }
}
