//! World state and engine service seams for the Menagerie simulation.
//!
//! This crate holds everything the behavior layer acts upon but does not
//! decide: the placed resources, the tree occupancy registry, and the traits
//! standing in for the engine's navigation, physics, and animation services.
//!
//! # Modules
//!
//! - [`error`] -- [`WorldError`] for registry and resource lookups
//! - [`trees`] -- [`TreeRegistry`], the exclusive claim/release store for trees
//! - [`resources`] -- Food items, feeding areas, sleeping areas, water zones
//! - [`spatial`] -- [`SpatialQuery`] overlap queries and the [`World`] aggregate
//! - [`locomotion`] -- [`Locomotion`] navigation agent seam and [`PathStatus`]
//! - [`navmesh`] -- [`FlatNavMesh`], an in-memory [`Locomotion`] implementation
//! - [`presentation`] -- [`Presentation`] animation/emotion seam and a recorder

pub mod error;
pub mod locomotion;
pub mod navmesh;
pub mod presentation;
pub mod resources;
pub mod spatial;
pub mod trees;

pub use error::WorldError;
pub use locomotion::{Locomotion, PathStatus, set_speed};
pub use navmesh::{BlockedRegion, FlatNavMesh};
pub use presentation::{Presentation, PresentationEvent, RecordingPresentation};
pub use resources::{
    FeedingArea, FoodItem, SleepingArea, WaterZone, WorldResources, planar_distance,
};
pub use spatial::{Category, EntityRef, SpatialHit, SpatialQuery, World, nearest_hit};
pub use trees::{Tree, TreeRegistry};
