//! The navigation-agent seam.
//!
//! [`Locomotion`] is how the behavior layer talks to the engine's pathfinding
//! and agent movement. It is deliberately shaped like a navmesh agent API:
//! a destination is set, the path may be pending for a frame, the agent then
//! moves and eventually reports arrival. Every call takes the pet whose agent
//! should be affected; calls for unknown pets are ignored.

use glam::Vec3;
use menagerie_types::{LocomotionParams, PetId};

/// Status of a pet's current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathStatus {
    /// No destination.
    Idle,
    /// A path is being computed.
    Pending,
    /// Following a path.
    Moving,
    /// Within stopping distance of the destination.
    Arrived,
    /// The last requested destination could not be reached.
    Unreachable,
}

/// Engine-provided navigation agents, one per pet.
pub trait Locomotion {
    /// Create an agent for `pet`.
    fn register(&mut self, pet: PetId, position: Vec3, params: LocomotionParams);

    /// Remove the agent for `pet`.
    fn unregister(&mut self, pet: PetId);

    /// Current transform position.
    fn position(&self, pet: PetId) -> Option<Vec3>;

    /// Current facing direction (unit vector on the XZ plane).
    fn forward(&self, pet: PetId) -> Option<Vec3>;

    /// Request a path to `target`. Returns `false` when the agent is invalid,
    /// disabled, or the target is unreachable.
    fn set_destination(&mut self, pet: PetId, target: Vec3) -> bool;

    /// The destination of the current path.
    fn destination(&self, pet: PetId) -> Option<Vec3>;

    /// Drop the current path.
    fn reset_path(&mut self, pet: PetId);

    /// Status of the current path.
    fn path_status(&self, pet: PetId) -> PathStatus;

    /// Whether the path is still being computed.
    fn is_path_pending(&self, pet: PetId) -> bool {
        self.path_status(pet) == PathStatus::Pending
    }

    /// Distance left to the destination, or infinity without one.
    fn remaining_distance(&self, pet: PetId) -> f32;

    /// Current velocity.
    fn velocity(&self, pet: PetId) -> Vec3;

    /// Halt movement but keep the path.
    fn stop(&mut self, pet: PetId);

    /// Continue along the kept path.
    fn resume(&mut self, pet: PetId);

    /// Whether the agent is halted.
    fn is_stopped(&self, pet: PetId) -> bool;

    /// Enable or disable the agent. A disabled agent ignores paths and can be
    /// moved freely with [`Locomotion::set_position`].
    fn set_enabled(&mut self, pet: PetId, enabled: bool);

    /// Whether the agent is enabled.
    fn is_enabled(&self, pet: PetId) -> bool;

    /// Whether the agent stands on a navigable surface.
    fn is_on_navmesh(&self, pet: PetId) -> bool;

    /// Teleport the agent onto the navigable surface. Returns `false` when the
    /// point is not navigable.
    fn warp(&mut self, pet: PetId, position: Vec3) -> bool;

    /// Move the transform without navigation (used while the agent is
    /// disabled, e.g. climbing).
    fn set_position(&mut self, pet: PetId, position: Vec3);

    /// Live locomotion parameters.
    fn params(&self, pet: PetId) -> Option<LocomotionParams>;

    /// Overwrite live locomotion parameters.
    fn set_params(&mut self, pet: PetId, params: LocomotionParams);

    /// Whether the agent turns to face its movement direction.
    fn update_rotation(&self, pet: PetId) -> bool;

    /// Set whether the agent turns to face its movement direction.
    fn set_update_rotation(&mut self, pet: PetId, enabled: bool);

    /// Turn towards `point` by at most `degrees_per_second * dt`. Returns the
    /// angle in degrees still left to turn.
    fn rotate_towards(&mut self, pet: PetId, point: Vec3, degrees_per_second: f32, dt: f32)
    -> f32;

    /// Nearest navigable point within `max_radius` of `point`.
    fn sample_position(&self, point: Vec3, max_radius: f32) -> Option<Vec3>;

    /// Whether a complete path exists between two points.
    fn path_complete(&self, from: Vec3, to: Vec3) -> bool;

    /// Advance every agent by `dt` seconds.
    fn advance(&mut self, dt: f32);
}

/// Apply new speed-related parameters while keeping the rest of the live set.
pub fn set_speed<L: Locomotion + ?Sized>(locomotion: &mut L, pet: PetId, speed: f32) {
    if let Some(mut params) = locomotion.params(pet) {
        params.speed = speed;
        locomotion.set_params(pet, params);
    }
}
