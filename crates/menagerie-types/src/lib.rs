//! Shared type definitions for the Menagerie pet behavior simulation.
//!
//! This crate is the single source of truth for the identifiers, tags, and
//! small value types that every other crate in the workspace passes around.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for pets, trees, food, areas, sessions
//! - [`enums`] -- Species, personality, habitat, food, animation, emotion
//! - [`diet`] -- [`DietFlags`] bitmask over food categories
//! - [`structs`] -- Pet profile and locomotion parameters

pub mod diet;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use diet::DietFlags;
pub use enums::{
    AnimationState, Emotion, FoodType, Habitat, InteractionKind, Personality, Species,
};
pub use glam::Vec3;
pub use ids::{AreaId, FoodItemId, PetId, SessionId, TreeId};
pub use structs::{LocomotionParams, LocomotionScale, PetProfile};
