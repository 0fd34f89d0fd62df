//! Interaction registry: which pets are in a session and which pairs rest.

use std::collections::{BTreeMap, BTreeSet};

use menagerie_types::PetId;

/// Order-independent key for a pair of pets.
fn pair_key(a: PetId, b: PetId) -> (PetId, PetId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Busy pets and per-pair cooldowns.
#[derive(Debug, Clone, Default)]
pub struct InteractionRegistry {
    busy: BTreeSet<PetId>,
    cooldowns: BTreeMap<(PetId, PetId), f32>,
}

impl InteractionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `pet` is in a session.
    pub fn is_busy(&self, pet: PetId) -> bool {
        self.busy.contains(&pet)
    }

    /// Whether the pair still has to wait before interacting again.
    pub fn on_cooldown(&self, a: PetId, b: PetId) -> bool {
        self.cooldowns.contains_key(&pair_key(a, b))
    }

    /// Seconds left on the pair's cooldown.
    pub fn cooldown(&self, a: PetId, b: PetId) -> Option<f32> {
        self.cooldowns.get(&pair_key(a, b)).copied()
    }

    /// Mark both pets as in a session.
    pub fn mark_busy(&mut self, a: PetId, b: PetId) {
        self.busy.insert(a);
        self.busy.insert(b);
    }

    /// Free both pets and start the pair's cooldown.
    pub fn free(&mut self, a: PetId, b: PetId, cooldown: f32) {
        self.busy.remove(&a);
        self.busy.remove(&b);
        if cooldown > 0.0 {
            self.cooldowns.insert(pair_key(a, b), cooldown);
        }
    }

    /// Count cooldowns down, dropping the expired ones.
    pub fn tick(&mut self, dt: f32) {
        self.cooldowns.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });
    }

    /// Number of pets in a session.
    pub fn busy_count(&self) -> usize {
        self.busy.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_starts_symmetric_cooldown() {
        let a = PetId::new();
        let b = PetId::new();
        let mut registry = InteractionRegistry::new();

        registry.mark_busy(a, b);
        assert!(registry.is_busy(a));
        assert!(registry.is_busy(b));

        registry.free(b, a, 10.0);
        assert!(!registry.is_busy(a));
        assert!(registry.on_cooldown(a, b));
        assert!(registry.on_cooldown(b, a));

        registry.tick(4.0);
        assert!(registry.on_cooldown(a, b));
        registry.tick(6.5);
        assert!(!registry.on_cooldown(a, b));
    }
}
