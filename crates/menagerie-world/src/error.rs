//! Error types for the `menagerie-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`]. None of these
//! are fatal to the simulation: callers log and abandon the attempt.

use menagerie_types::{FoodItemId, PetId, TreeId};

/// Errors that can occur during world-resource operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorldError {
    /// A tree was not found in the registry.
    #[error("tree not found: {0}")]
    TreeNotFound(TreeId),

    /// The tree is already held by another pet.
    #[error("tree {tree} is occupied by pet {owner}")]
    TreeOccupied {
        /// The contested tree.
        tree: TreeId,
        /// The pet currently holding the claim.
        owner: PetId,
    },

    /// A pet tried to release a tree it does not hold.
    #[error("pet {pet} does not occupy tree {tree}")]
    NotOccupant {
        /// The tree.
        tree: TreeId,
        /// The pet that attempted the release.
        pet: PetId,
    },

    /// A food item was not found (already eaten or never placed).
    #[error("food item not found: {0}")]
    FoodNotFound(FoodItemId),
}
