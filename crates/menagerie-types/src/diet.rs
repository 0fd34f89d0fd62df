//! Diet bitmask over food categories.
//!
//! A pet's diet is a set of [`FoodType`]s; a feeding area advertises the set
//! it serves. Matching is set intersection.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::enums::FoodType;

bitflags! {
    /// The food categories a pet eats or an area serves.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct DietFlags: u8 {
        /// Meat.
        const MEAT = 1;
        /// Fish.
        const FISH = 1 << 1;
        /// Fruits and vegetables.
        const FRUITS_AND_VEGETABLES = 1 << 2;
        /// Insects.
        const INSECTS = 1 << 3;
        /// Grass and hay.
        const GRASS = 1 << 4;
        /// Nuts and seeds.
        const NUTS = 1 << 5;
    }
}

impl From<FoodType> for DietFlags {
    fn from(food: FoodType) -> Self {
        match food {
            FoodType::Meat => Self::MEAT,
            FoodType::Fish => Self::FISH,
            FoodType::FruitsAndVegetables => Self::FRUITS_AND_VEGETABLES,
            FoodType::Insects => Self::INSECTS,
            FoodType::Grass => Self::GRASS,
            FoodType::Nuts => Self::NUTS,
        }
    }
}

impl DietFlags {
    /// Whether a pet with this diet can eat `food`.
    pub fn accepts(self, food: FoodType) -> bool {
        self.intersects(Self::from(food))
    }

    /// Whether a pet with this diet can use an area serving `served`.
    pub const fn matches(self, served: Self) -> bool {
        self.intersects(served)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_intersecting_food() {
        let diet = DietFlags::FRUITS_AND_VEGETABLES | DietFlags::NUTS;
        assert!(diet.accepts(FoodType::Nuts));
        assert!(!diet.accepts(FoodType::Meat));
    }

    #[test]
    fn empty_diet_matches_nothing() {
        assert!(!DietFlags::empty().matches(DietFlags::all()));
    }
}
