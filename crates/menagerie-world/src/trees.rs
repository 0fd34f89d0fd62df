//! Tree occupancy registry.
//!
//! Trees are the only world resource that pets hold exclusively. The registry
//! is the single owner of occupancy state: a claim either succeeds and records
//! the pet as occupant, or fails without touching anything. Because the whole
//! simulation runs on one thread inside one tick, "check then set" inside
//! [`TreeRegistry::claim`] is atomic with respect to every other pet.

use std::collections::BTreeMap;

use glam::Vec3;
use menagerie_types::{PetId, TreeId};
use tracing::debug;

use crate::error::WorldError;

/// A climbable tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// Tree identifier.
    pub id: TreeId,
    /// Ground position of the trunk.
    pub position: Vec3,
    /// Bounding height of the tree.
    pub height: f32,
    /// Pet currently holding the tree, if any.
    occupant: Option<PetId>,
}

impl Tree {
    /// The pet currently holding the tree.
    pub const fn occupant(&self) -> Option<PetId> {
        self.occupant
    }

    /// Whether nobody holds the tree.
    pub const fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

/// Registry of every climbable tree and who occupies it.
#[derive(Debug, Clone, Default)]
pub struct TreeRegistry {
    trees: BTreeMap<TreeId, Tree>,
}

impl TreeRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            trees: BTreeMap::new(),
        }
    }

    /// Register a tree at world load. Returns its new identifier.
    pub fn register(&mut self, position: Vec3, height: f32) -> TreeId {
        let id = TreeId::new();
        self.trees.insert(
            id,
            Tree {
                id,
                position,
                height,
                occupant: None,
            },
        );
        id
    }

    /// Look up a tree.
    pub fn get(&self, id: TreeId) -> Option<&Tree> {
        self.trees.get(&id)
    }

    /// Iterate over all trees in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Tree> {
        self.trees.values()
    }

    /// Number of registered trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether no trees are registered.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// The pet currently holding `id`, if any.
    pub fn occupant(&self, id: TreeId) -> Option<PetId> {
        self.trees.get(&id).and_then(Tree::occupant)
    }

    /// The tree currently held by `pet`, if any.
    pub fn held_by(&self, pet: PetId) -> Option<TreeId> {
        self.trees
            .values()
            .find(|tree| tree.occupant == Some(pet))
            .map(|tree| tree.id)
    }

    /// Claim a tree for `pet`.
    ///
    /// Claiming a tree the pet already holds is a no-op success. Claiming a
    /// tree held by another pet fails with [`WorldError::TreeOccupied`] and
    /// leaves occupancy unchanged.
    pub fn claim(&mut self, id: TreeId, pet: PetId) -> Result<(), WorldError> {
        let tree = self.trees.get_mut(&id).ok_or(WorldError::TreeNotFound(id))?;
        match tree.occupant {
            Some(owner) if owner == pet => Ok(()),
            Some(owner) => {
                debug!(tree = %id, %pet, %owner, "Tree claim rejected");
                Err(WorldError::TreeOccupied { tree: id, owner })
            }
            None => {
                tree.occupant = Some(pet);
                debug!(tree = %id, %pet, "Tree claimed");
                Ok(())
            }
        }
    }

    /// Release a tree held by `pet`.
    ///
    /// Releasing a free tree is a no-op success so that cleanup paths can call
    /// this unconditionally. Releasing a tree held by someone else fails with
    /// [`WorldError::NotOccupant`].
    pub fn release(&mut self, id: TreeId, pet: PetId) -> Result<(), WorldError> {
        let tree = self.trees.get_mut(&id).ok_or(WorldError::TreeNotFound(id))?;
        match tree.occupant {
            None => Ok(()),
            Some(owner) if owner == pet => {
                tree.occupant = None;
                debug!(tree = %id, %pet, "Tree released");
                Ok(())
            }
            Some(_) => Err(WorldError::NotOccupant { tree: id, pet }),
        }
    }

    /// Release every tree held by `pet`. Returns how many were released.
    pub fn release_all(&mut self, pet: PetId) -> usize {
        let mut released: usize = 0;
        for tree in self.trees.values_mut() {
            if tree.occupant == Some(pet) {
                tree.occupant = None;
                released = released.saturating_add(1);
            }
        }
        released
    }

    /// The nearest free tree whose trunk lies within `radius` of `origin`.
    ///
    /// Ties go to the first tree in identifier order.
    pub fn nearest_free(&self, origin: Vec3, radius: f32) -> Option<&Tree> {
        let radius_sq = radius * radius;
        let mut best: Option<(&Tree, f32)> = None;
        for tree in self.trees.values().filter(|tree| tree.is_free()) {
            let dist_sq = tree.position.distance_squared(origin);
            if dist_sq > radius_sq {
                continue;
            }
            if best.is_none_or(|(_, best_sq)| dist_sq < best_sq) {
                best = Some((tree, dist_sq));
            }
        }
        best.map(|(tree, _)| tree)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn claim_free_tree_succeeds() {
        let mut registry = TreeRegistry::new();
        let tree = registry.register(Vec3::ZERO, 4.0);
        let pet = PetId::new();

        assert!(registry.claim(tree, pet).is_ok());
        assert_eq!(registry.occupant(tree), Some(pet));
        assert_eq!(registry.held_by(pet), Some(tree));
    }

    #[test]
    fn claim_occupied_tree_fails_without_mutation() {
        let mut registry = TreeRegistry::new();
        let tree = registry.register(Vec3::ZERO, 4.0);
        let first = PetId::new();
        let second = PetId::new();

        registry.claim(tree, first).unwrap();
        let result = registry.claim(tree, second);

        assert_eq!(
            result,
            Err(WorldError::TreeOccupied {
                tree,
                owner: first
            })
        );
        assert_eq!(registry.occupant(tree), Some(first));
        assert_eq!(registry.held_by(second), None);
    }

    #[test]
    fn reclaim_by_same_pet_is_idempotent() {
        let mut registry = TreeRegistry::new();
        let tree = registry.register(Vec3::ZERO, 4.0);
        let pet = PetId::new();
        registry.claim(tree, pet).unwrap();
        assert!(registry.claim(tree, pet).is_ok());
        assert_eq!(registry.occupant(tree), Some(pet));
    }

    #[test]
    fn release_by_non_owner_is_rejected() {
        let mut registry = TreeRegistry::new();
        let tree = registry.register(Vec3::ZERO, 4.0);
        let owner = PetId::new();
        let intruder = PetId::new();
        registry.claim(tree, owner).unwrap();

        assert!(registry.release(tree, intruder).is_err());
        assert_eq!(registry.occupant(tree), Some(owner));

        assert!(registry.release(tree, owner).is_ok());
        assert!(registry.get(tree).unwrap().is_free());
        // Releasing again is harmless.
        assert!(registry.release(tree, owner).is_ok());
    }

    #[test]
    fn nearest_free_skips_occupied_and_far_trees() {
        let mut registry = TreeRegistry::new();
        let near = registry.register(Vec3::new(2.0, 0.0, 0.0), 4.0);
        let middle = registry.register(Vec3::new(5.0, 0.0, 0.0), 4.0);
        let _far = registry.register(Vec3::new(50.0, 0.0, 0.0), 4.0);
        registry.claim(near, PetId::new()).unwrap();

        let found = registry.nearest_free(Vec3::ZERO, 10.0).unwrap();
        assert_eq!(found.id, middle);
        assert!(registry.nearest_free(Vec3::new(-30.0, 0.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn release_all_frees_every_claim() {
        let mut registry = TreeRegistry::new();
        let a = registry.register(Vec3::ZERO, 4.0);
        let pet = PetId::new();
        registry.claim(a, pet).unwrap();
        assert_eq!(registry.release_all(pet), 1);
        assert_eq!(registry.release_all(pet), 0);
        assert!(registry.get(a).unwrap().is_free());
    }
}
